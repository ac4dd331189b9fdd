//! Operation router: one host request in, one JSON result out.
//!
//! Every mutating call is a single download, in-memory edits, and a single
//! upload. Read-only calls never upload.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use crate::engine::{
    append, ops, resolve_key_columns, sheet_mut, upsert, ColumnMapping, DataMode, InputItem,
    UpsertOptions,
};
use crate::error::{Result, XlrelayError};
use crate::transport::{FileLocator, Transport, WorkbookSession};
use crate::types::Workbook;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    Workbook,
    Sheet,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Workbook => "workbook",
            Self::Sheet => "sheet",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    GetSheets,
    GetColumns,
    ReadRows,
    Append,
    Upsert,
    Clear,
    DeleteRows,
    UpdateCell,
}

impl OperationKind {
    /// Whether the operation writes the workbook back.
    pub fn is_mutating(self) -> bool {
        matches!(
            self,
            Self::Append | Self::Upsert | Self::Clear | Self::DeleteRows | Self::UpdateCell
        )
    }

    fn resource(self) -> Resource {
        match self {
            Self::GetSheets => Resource::Workbook,
            _ => Resource::Sheet,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GetSheets => "getSheets",
            Self::GetColumns => "getColumns",
            Self::ReadRows => "readRows",
            Self::Append => "append",
            Self::Upsert => "upsert",
            Self::Clear => "clear",
            Self::DeleteRows => "deleteRows",
            Self::UpdateCell => "updateCell",
        })
    }
}

/// A sheet picked by name, either directly or through a `{mode, value}`
/// locator as produced by list/name pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetLocator {
    Name(String),
    Locator {
        #[serde(default)]
        mode: Option<String>,
        value: String,
    },
}

impl SheetLocator {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Locator { value: name, .. } => name,
        }
    }
}

/// Operation parameters. Absent values fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Params {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_row: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_column: Option<String>,
    /// Request-level mapping, used for items that carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<ColumnMapping>,
    /// Request-level raw JSON, used for items that carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_new_rows: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_headers: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_row: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub resource: Resource,
    pub operation: OperationKind,
    pub file: FileLocator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<SheetLocator>,
    #[serde(flatten)]
    pub params: Params,
}

impl Request {
    fn header_row(&self) -> Result<u32> {
        match self.params.header_row {
            None => Ok(1),
            Some(n) => u32::try_from(n)
                .ok()
                .filter(|&n| n >= 1)
                .ok_or_else(|| XlrelayError::validation("Header row must be a positive integer")),
        }
    }

    fn data_mode(&self) -> Result<DataMode> {
        self.params
            .data_mode
            .as_deref()
            .map_or(Ok(DataMode::AutoMap), str::parse)
    }

    fn sheet_name(&self) -> Result<&str> {
        self.sheet
            .as_ref()
            .map(SheetLocator::name)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                XlrelayError::validation(format!(
                    "Sheet name is required for operation {}",
                    self.operation
                ))
            })
    }

    /// Fill per-item parameters from the request level.
    ///
    /// Manual and raw modes carry their data in parameters, so an empty item
    /// list still yields one item for them.
    fn prepare_items(&self, mode: DataMode, items: &[InputItem]) -> Vec<InputItem> {
        let mut prepared: Vec<InputItem> = items.to_vec();
        if prepared.is_empty() && mode != DataMode::AutoMap {
            prepared.push(InputItem::default());
        }
        for item in &mut prepared {
            if item.columns.is_none() {
                item.columns.clone_from(&self.params.columns);
            }
            if item.row_data.is_none() {
                item.row_data.clone_from(&self.params.row_data);
            }
        }
        prepared
    }
}

/// Runs requests against one transport.
#[derive(Debug)]
pub struct Router<T> {
    session: WorkbookSession<T>,
}

impl<T: Transport> Router<T> {
    pub fn new(transport: T) -> Self {
        Self {
            session: WorkbookSession::new(transport),
        }
    }

    pub fn transport(&self) -> &T {
        self.session.transport()
    }

    /// Execute one request with the host's input items.
    pub fn execute(&self, request: &Request, items: &[InputItem]) -> Result<Value> {
        if request.operation.resource() != request.resource {
            return Err(XlrelayError::validation(format!(
                "Operation {} is not supported for resource {}",
                request.operation, request.resource
            )));
        }
        // Parameter checks that need no workbook come before the download
        let header_row = request.header_row()?;
        let mode = request.data_mode()?;
        if request.resource == Resource::Sheet {
            request.sheet_name()?;
        }

        let mut workbook = self.session.load(&request.file)?;
        let result = self.dispatch(request, header_row, mode, &mut workbook, items)?;

        if request.operation.is_mutating() {
            self.session.save(&request.file, &workbook)?;
        }
        log::info!("{} on {} succeeded", request.operation, request.file);
        Ok(result)
    }

    fn dispatch(
        &self,
        request: &Request,
        header_row: u32,
        mode: DataMode,
        workbook: &mut Workbook,
        items: &[InputItem],
    ) -> Result<Value> {
        if request.operation == OperationKind::GetSheets {
            return Ok(json!({
                "success": true,
                "sheets": ops::list_sheets(workbook),
            }));
        }

        let name = request.sheet_name()?;
        let sheet = sheet_mut(workbook, name)?;
        let params = &request.params;

        let value = match request.operation {
            OperationKind::GetColumns => json!({
                "success": true,
                "columns": ops::get_columns(sheet, header_row),
                "sheet": sheet.name,
            }),
            OperationKind::ReadRows => json!({
                "success": true,
                "rows": ops::read_rows(sheet, header_row, params.start_row, params.limit),
                "sheet": sheet.name,
            }),
            OperationKind::Append => {
                let items = request.prepare_items(mode, items);
                let outcome = append(sheet, header_row, mode, &items)?;
                json!({
                    "success": true,
                    "rowsAdded": outcome.rows_added,
                    "sheet": outcome.sheet,
                })
            }
            OperationKind::Upsert => {
                let items = request.prepare_items(mode, items);
                let mapping = params
                    .columns
                    .as_ref()
                    .or_else(|| items.first().and_then(|i| i.columns.as_ref()));
                let key_columns =
                    resolve_key_columns(mode, params.key_column.as_deref(), mapping)?;
                let options = UpsertOptions {
                    index_new_rows: params.index_new_rows.unwrap_or(false),
                };
                let outcome = upsert(sheet, header_row, mode, &key_columns, &items, options)?;
                json!({
                    "success": true,
                    "rowsUpdated": outcome.rows_updated,
                    "rowsAppended": outcome.rows_appended,
                    "sheet": outcome.sheet,
                })
            }
            OperationKind::Clear => {
                let cleared = ops::clear(sheet, header_row, params.keep_headers.unwrap_or(true));
                json!({
                    "success": true,
                    "rowsCleared": cleared,
                    "sheet": sheet.name,
                })
            }
            OperationKind::DeleteRows => {
                let deleted = ops::delete_rows(
                    sheet,
                    params.start_row.unwrap_or(0),
                    params.count.unwrap_or(1),
                )?;
                json!({
                    "success": true,
                    "rowsDeleted": deleted,
                    "sheet": sheet.name,
                })
            }
            OperationKind::UpdateCell => {
                let cell = ops::update_cell(
                    sheet,
                    params.cell.as_deref().unwrap_or_default(),
                    params.value.as_ref().unwrap_or(&Value::Null),
                )?;
                json!({
                    "success": true,
                    "cell": cell,
                    "sheet": sheet.name,
                })
            }
            OperationKind::GetSheets => json!({ "success": true }),
        };
        Ok(value)
    }
}
