use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::AppError;
use crate::fetch::{BasicClient, BearerAuth, send_json};
use crate::model::{ScoreEntry, ScoreRecord};
use crate::services::{ScoreStore, SubjectCatalog};
use crate::sheets::token::TokenSource;
use crate::sheets::{ValueRange, parse_score_log, parse_subjects};

const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

const CATALOG_WORKSHEET: usize = 0;
const SCORE_LOG_WORKSHEET: usize = 1;

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
    #[serde(default)]
    index: usize,
}

/// Client for one spreadsheet, addressing worksheets by position.
pub struct SheetsClient {
    http: BasicClient,
    tokens: TokenSource,
    spreadsheet_url: Url,
    worksheets: Vec<String>,
}

impl SheetsClient {
    /// Authenticates and opens the configured spreadsheet.
    ///
    /// Every failure here is reported as [`AppError::Configuration`]: without
    /// an open spreadsheet there is nothing the session can do.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        let http = BasicClient::with_timeouts(Duration::from_secs(30), Duration::from_secs(10))
            .map_err(|e| AppError::Configuration(format!("cannot build HTTP client: {e}")))?;
        let tokens = TokenSource::new(config.credentials.clone())?;
        let spreadsheet_url = spreadsheet_url(&config.spreadsheet_id)
            .map_err(|e| AppError::Configuration(format!("{e:#}")))?;

        let mut client = Self {
            http,
            tokens,
            spreadsheet_url,
            worksheets: Vec::new(),
        };

        client.worksheets = client.load_worksheets().await.map_err(|e| {
            AppError::Configuration(format!(
                "cannot open spreadsheet {}: {e:#}",
                config.spreadsheet_id
            ))
        })?;

        info!(
            spreadsheet_id = %config.spreadsheet_id,
            worksheets = client.worksheets.len(),
            "Spreadsheet opened"
        );

        Ok(client)
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.spreadsheet_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("spreadsheet URL cannot take a path"))?
            .extend(segments);
        Ok(url)
    }

    fn worksheet(&self, index: usize) -> Result<&str> {
        self.worksheets
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| anyhow!("spreadsheet has no worksheet #{}", index + 1))
    }

    async fn send<T: DeserializeOwned>(&self, req: reqwest::Request) -> Result<T> {
        let token = self.tokens.access_token(&self.http).await?;
        let client = BearerAuth::new(&self.http, &token)?;
        send_json(&client, req).await
    }

    #[tracing::instrument(skip(self))]
    async fn load_worksheets(&self) -> Result<Vec<String>> {
        let req = self
            .http
            .request(Method::GET, self.url(&[])?)
            .query(&[("fields", "sheets.properties(title,index)")])
            .build()?;

        let meta: SpreadsheetMeta = self.send(req).await?;

        let mut sheets: Vec<SheetProperties> =
            meta.sheets.into_iter().map(|s| s.properties).collect();
        sheets.sort_by_key(|p| p.index);

        Ok(sheets.into_iter().map(|p| p.title).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn read_values(
        &self,
        worksheet: usize,
        cells: Option<&str>,
        unformatted: bool,
    ) -> Result<ValueRange> {
        let range = a1_range(self.worksheet(worksheet)?, cells);
        let mut builder = self
            .http
            .request(Method::GET, self.url(&["values", range.as_str()])?);
        if unformatted {
            builder = builder.query(&[("valueRenderOption", "UNFORMATTED_VALUE")]);
        }

        let values: ValueRange = self.send(builder.build()?).await?;
        debug!(range = %range, rows = values.values.len(), "Values read");
        Ok(values)
    }

    #[tracing::instrument(skip(self, row))]
    async fn append_row(&self, row: Vec<Value>) -> Result<()> {
        let range = format!("{}:append", a1_range(self.worksheet(SCORE_LOG_WORKSHEET)?, Some("A1")));

        let req = self
            .http
            .request(Method::POST, self.url(&["values", range.as_str()])?)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&json!({ "values": [row] }))
            .build()?;

        let _: Value = self.send(req).await?;
        Ok(())
    }
}

#[async_trait]
impl SubjectCatalog for SheetsClient {
    async fn subjects(&self) -> Result<Vec<String>, AppError> {
        let range = self
            .read_values(CATALOG_WORKSHEET, Some("A:A"), false)
            .await
            .context("Failed to load subject catalog")
            .map_err(AppError::connection)?;

        Ok(parse_subjects(&range.values))
    }
}

#[async_trait]
impl ScoreStore for SheetsClient {
    async fn append(&self, entry: &ScoreEntry) -> Result<(), AppError> {
        self.append_row(entry.to_row())
            .await
            .context("Failed to append score")
            .map_err(AppError::write)
    }

    async fn read_all(&self) -> Result<Vec<ScoreRecord>, AppError> {
        let range = self
            .read_values(SCORE_LOG_WORKSHEET, None, true)
            .await
            .context("Failed to read score log")
            .map_err(AppError::connection)?;

        parse_score_log(&range.values)
    }
}

fn spreadsheet_url(spreadsheet_id: &str) -> Result<Url> {
    let mut url = Url::parse(SHEETS_API_URL)?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("Sheets API URL cannot take a path"))?
        .push(spreadsheet_id);
    Ok(url)
}

/// A1 notation for a whole worksheet or a cell range within it. Titles are
/// always quoted, with embedded quotes doubled.
fn a1_range(title: &str, cells: Option<&str>) -> String {
    let quoted = format!("'{}'", title.replace('\'', "''"));
    match cells {
        Some(cells) => format!("{quoted}!{cells}"),
        None => quoted,
    }
}
