//! JSON I/O handling for CLI
//!
//! - Input: single JSON request via stdin
//! - Output: single JSON object via stdout
//! - UTF-8 only
//!
//! Responses are serialized straight from the descriptors so documents
//! keep their key order and duplicate keys.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::document::{Document, Value};
use crate::query::QueryAst;

/// One compile request, selected by `op`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    All {
        query: QueryAst,
        #[serde(default)]
        params: Vec<Value>,
    },
    Count {
        query: QueryAst,
        #[serde(default)]
        params: Vec<Value>,
    },
    UpdateAll {
        query: QueryAst,
        #[serde(default)]
        params: Vec<Value>,
    },
    DeleteAll {
        query: QueryAst,
        #[serde(default)]
        params: Vec<Value>,
    },
    Insert {
        coll: String,
        #[serde(default)]
        model: Option<String>,
        document: Document,
    },
    Update {
        coll: String,
        #[serde(default)]
        model: Option<String>,
        values: Document,
        filter: Document,
    },
    Delete {
        coll: String,
        #[serde(default)]
        model: Option<String>,
        filter: Document,
    },
}

impl Request {
    /// Rejects queries reading params the request does not carry
    fn check_params(&self) -> CliResult<()> {
        let (query, params) = match self {
            Request::All { query, params }
            | Request::Count { query, params }
            | Request::UpdateAll { query, params }
            | Request::DeleteAll { query, params } => (query, params),
            Request::Insert { .. } | Request::Update { .. } | Request::Delete { .. } => {
                return Ok(())
            }
        };

        let needed = query.param_bound();
        if needed > params.len() {
            return Err(CliError::invalid_request(format!(
                "Query reads params beyond the {} given",
                params.len()
            )));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct OkResponse<'a, T> {
    status: &'static str,
    data: &'a T,
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    status: &'static str,
    code: &'a str,
    message: &'a str,
}

/// Parse a JSON request
pub fn parse_request(input: &str) -> CliResult<Request> {
    if input.trim().is_empty() {
        return Err(CliError::invalid_request("Empty input"));
    }
    let request: Request = serde_json::from_str(input)?;
    request.check_params()?;
    Ok(request)
}

/// Read a JSON request from stdin
pub fn read_request() -> CliResult<Request> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;
    parse_request(&input)
}

/// Write a success response to stdout
pub fn write_response<T: Serialize>(data: &T) -> CliResult<()> {
    write_response_to(&mut io::stdout(), data)
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_error_to(&mut io::stdout(), code, message)
}

/// Write plain text to stdout
pub fn write_text(text: &str) -> CliResult<()> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", text)?;
    stdout.flush()?;

    Ok(())
}

pub(crate) fn write_response_to<W: Write, T: Serialize>(writer: &mut W, data: &T) -> CliResult<()> {
    let response = OkResponse { status: "ok", data };
    write_line(writer, &response)
}

pub(crate) fn write_error_to<W: Write>(writer: &mut W, code: &str, message: &str) -> CliResult<()> {
    let response = ErrorResponse {
        status: "error",
        code,
        message,
    };
    write_line(writer, &response)
}

fn write_line<W: Write, T: Serialize>(writer: &mut W, response: &T) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, response)?;
    writeln!(writer)?;
    writer.flush()?;

    Ok(())
}
