use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::domain::ResultRecord;
use crate::error::SinkError;

/// Header of the result log, in column order. Matches the CSV layout that
/// JMeter-compatible reporting tools expect.
pub const RESULT_LOG_COLUMNS: [&str; 17] = [
    "timeStamp",
    "elapsed",
    "label",
    "responseCode",
    "responseMessage",
    "threadName",
    "dataType",
    "success",
    "failureMessage",
    "bytes",
    "sentBytes",
    "grpThreads",
    "allThreads",
    "URL",
    "Latency",
    "IdleTime",
    "Connect",
];

const DATA_TYPE: &str = "text";
const IDLE_TIME: &str = "0";

/// Serialises `records` into result-log bytes, header first.
///
/// # Errors
///
/// Returns an error when a row cannot be encoded.
pub fn encode_result_log(records: &[ResultRecord], path: &Path) -> Result<Vec<u8>, SinkError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    let write_err = |err: csv::Error| SinkError::WriteLog {
        path: path.to_path_buf(),
        source: err,
    };
    writer.write_record(RESULT_LOG_COLUMNS).map_err(write_err)?;
    for record in records {
        writer.write_record(row(record)).map_err(write_err)?;
    }
    writer.into_inner().map_err(|err| SinkError::Flush {
        path: path.to_path_buf(),
        source: err.into_error(),
    })
}

fn row(record: &ResultRecord) -> [String; 17] {
    [
        record.timestamp_ms().max(0).to_string(),
        record.elapsed_ms().to_string(),
        record.request_name().to_owned(),
        record.status_code().to_string(),
        record.response_message().to_owned(),
        record.thread_name().to_owned(),
        DATA_TYPE.to_owned(),
        record.success().to_string(),
        record.error_message().unwrap_or_default().to_owned(),
        record.bytes().to_string(),
        record.sent_bytes().to_string(),
        record.group_threads().to_string(),
        record.all_threads().to_string(),
        record.url().to_owned(),
        record.latency_ms().to_string(),
        IDLE_TIME.to_owned(),
        record.connect_ms().to_string(),
    ]
}

/// Writes the result log to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns an error when encoding or any filesystem operation fails.
pub async fn write_result_log(path: &Path, records: &[ResultRecord]) -> Result<(), SinkError> {
    let bytes = encode_result_log(records, path)?;
    let file = tokio::fs::File::create(path)
        .await
        .map_err(|err| SinkError::Create {
            path: path.to_path_buf(),
            source: err,
        })?;
    let mut writer = BufWriter::new(file);
    let flush_err = |err: std::io::Error| SinkError::Flush {
        path: path.to_path_buf(),
        source: err,
    };
    writer.write_all(&bytes).await.map_err(flush_err)?;
    writer.flush().await.map_err(flush_err)?;
    Ok(())
}

/// Reads a result log back into records.
///
/// # Errors
///
/// Returns an error when the file cannot be read, a mandatory column is
/// missing, or a numeric field does not parse.
pub async fn read_result_log(path: &Path) -> Result<Vec<ResultRecord>, SinkError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| SinkError::ReadLog {
            path: path.to_path_buf(),
            source: csv::Error::from(err),
        })?;
    decode_result_log(&bytes, path)
}

/// Column positions resolved from the header. Only the columns that drive
/// aggregation are mandatory; the rest default when absent.
struct Columns {
    timestamp: usize,
    elapsed: usize,
    label: usize,
    response_code: usize,
    success: usize,
    response_message: Option<usize>,
    thread_name: Option<usize>,
    failure_message: Option<usize>,
    bytes: Option<usize>,
    sent_bytes: Option<usize>,
    grp_threads: Option<usize>,
    all_threads: Option<usize>,
    url: Option<usize>,
    latency: Option<usize>,
    connect: Option<usize>,
}

impl Columns {
    fn resolve(header: &StringRecord, path: &Path) -> Result<Self, SinkError> {
        let find = |name: &str| {
            header
                .iter()
                .position(|column| column.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &'static str| {
            find(name).ok_or_else(|| SinkError::MissingColumn {
                path: path.to_path_buf(),
                column: name,
            })
        };
        Ok(Self {
            timestamp: require("timeStamp")?,
            elapsed: require("elapsed")?,
            label: require("label")?,
            response_code: require("responseCode")?,
            success: require("success")?,
            response_message: find("responseMessage"),
            thread_name: find("threadName"),
            failure_message: find("failureMessage"),
            bytes: find("bytes"),
            sent_bytes: find("sentBytes"),
            grp_threads: find("grpThreads"),
            all_threads: find("allThreads"),
            url: find("URL"),
            latency: find("Latency"),
            connect: find("Connect"),
        })
    }
}

struct RowReader<'row> {
    row: &'row StringRecord,
    path: &'row Path,
    line: u64,
}

impl RowReader<'_> {
    fn text(&self, index: Option<usize>) -> &str {
        index.and_then(|index| self.row.get(index)).unwrap_or_default()
    }

    fn number<T: std::str::FromStr + Default>(
        &self,
        index: Option<usize>,
        column: &'static str,
    ) -> Result<T, SinkError> {
        let value = self.text(index).trim();
        if value.is_empty() {
            return Ok(T::default());
        }
        value.parse::<T>().map_err(|_err| SinkError::InvalidField {
            path: self.path.to_path_buf(),
            line: self.line,
            column,
            value: value.to_owned(),
        })
    }
}

/// Parses result-log bytes. `path` is only used in error messages.
///
/// # Errors
///
/// Returns an error on malformed CSV, a missing mandatory column, or an
/// unparsable numeric field.
pub fn decode_result_log(bytes: &[u8], path: &Path) -> Result<Vec<ResultRecord>, SinkError> {
    let read_err = |err: csv::Error| SinkError::ReadLog {
        path: path.to_path_buf(),
        source: err,
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);
    let header = reader.headers().map_err(read_err)?.clone();
    let columns = Columns::resolve(&header, path)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(read_err)?;
        let line = row.position().map_or(0, csv::Position::line);
        let fields = RowReader {
            row: &row,
            path,
            line,
        };
        records.push(parse_row(&fields, &columns)?);
    }
    Ok(records)
}

fn parse_row(fields: &RowReader<'_>, columns: &Columns) -> Result<ResultRecord, SinkError> {
    let thread_name = fields.text(columns.thread_name);
    let success = match fields.text(Some(columns.success)).trim() {
        value if value.eq_ignore_ascii_case("true") => true,
        value if value.eq_ignore_ascii_case("false") => false,
        other => {
            return Err(SinkError::InvalidField {
                path: fields.path.to_path_buf(),
                line: fields.line,
                column: "success",
                value: other.to_owned(),
            });
        }
    };
    let failure_message = fields.text(columns.failure_message);
    // Non-numeric codes (e.g. JMeter's "Non HTTP response code: ...") read as 0.
    let status_code = fields
        .text(Some(columns.response_code))
        .trim()
        .parse::<u16>()
        .unwrap_or(0);

    Ok(
        ResultRecord::builder(scenario_of(thread_name), fields.text(Some(columns.label)))
            .timestamp_ms(fields.number(Some(columns.timestamp), "timeStamp")?)
            .elapsed_ms(fields.number(Some(columns.elapsed), "elapsed")?)
            .latency_ms(fields.number(columns.latency, "Latency")?)
            .connect_ms(fields.number(columns.connect, "Connect")?)
            .status_code(status_code)
            .response_message(fields.text(columns.response_message))
            .thread_name(thread_name)
            .success(success)
            .error_message((!failure_message.is_empty()).then(|| failure_message.to_owned()))
            .bytes(fields.number(columns.bytes, "bytes")?)
            .sent_bytes(fields.number(columns.sent_bytes, "sentBytes")?)
            .threads(
                fields.number(columns.grp_threads, "grpThreads")?,
                fields.number(columns.all_threads, "allThreads")?,
            )
            .url(fields.text(columns.url))
            .build(),
    )
}

/// Thread names look like `"<scenario> <group>-<thread>"`; the scenario is
/// everything before the last space.
fn scenario_of(thread_name: &str) -> &str {
    thread_name
        .rsplit_once(' ')
        .map_or(thread_name, |(scenario, _)| scenario)
}
