/// Outcome of one executed logical request. Fields are fixed at
/// [`ResultRecordBuilder::build`]; aggregation only ever reads them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    timestamp_ms: i64,
    elapsed_ms: u64,
    latency_ms: u64,
    connect_ms: u64,
    request_name: String,
    scenario_name: String,
    status_code: u16,
    response_message: String,
    thread_name: String,
    success: bool,
    error_message: Option<String>,
    bytes: u64,
    sent_bytes: u64,
    group_threads: u64,
    all_threads: u64,
    url: String,
}

impl ResultRecord {
    #[must_use]
    pub fn builder(scenario_name: &str, request_name: &str) -> ResultRecordBuilder {
        ResultRecordBuilder::new(scenario_name, request_name)
    }

    /// Epoch milliseconds at which the request started.
    #[must_use]
    pub const fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    #[must_use]
    pub const fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Time until the response head arrived.
    #[must_use]
    pub const fn latency_ms(&self) -> u64 {
        self.latency_ms
    }

    #[must_use]
    pub const fn connect_ms(&self) -> u64 {
        self.connect_ms
    }

    #[must_use]
    pub fn request_name(&self) -> &str {
        &self.request_name
    }

    #[must_use]
    pub fn scenario_name(&self) -> &str {
        &self.scenario_name
    }

    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.status_code
    }

    #[must_use]
    pub fn response_message(&self) -> &str {
        &self.response_message
    }

    #[must_use]
    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        self.success
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    #[must_use]
    pub const fn bytes(&self) -> u64 {
        self.bytes
    }

    #[must_use]
    pub const fn sent_bytes(&self) -> u64 {
        self.sent_bytes
    }

    #[must_use]
    pub const fn group_threads(&self) -> u64 {
        self.group_threads
    }

    #[must_use]
    pub const fn all_threads(&self) -> u64 {
        self.all_threads
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Epoch milliseconds at which the request finished.
    #[must_use]
    pub fn end_ms(&self) -> i64 {
        let elapsed = i64::try_from(self.elapsed_ms).unwrap_or(i64::MAX);
        self.timestamp_ms.saturating_add(elapsed)
    }
}

#[derive(Debug, Clone)]
pub struct ResultRecordBuilder {
    record: ResultRecord,
}

impl ResultRecordBuilder {
    #[must_use]
    pub fn new(scenario_name: &str, request_name: &str) -> Self {
        Self {
            record: ResultRecord {
                timestamp_ms: 0,
                elapsed_ms: 0,
                latency_ms: 0,
                connect_ms: 0,
                request_name: request_name.to_owned(),
                scenario_name: scenario_name.to_owned(),
                status_code: 0,
                response_message: String::new(),
                thread_name: String::new(),
                success: false,
                error_message: None,
                bytes: 0,
                sent_bytes: 0,
                group_threads: 0,
                all_threads: 0,
                url: String::new(),
            },
        }
    }

    #[must_use]
    pub const fn timestamp_ms(mut self, timestamp_ms: i64) -> Self {
        self.record.timestamp_ms = timestamp_ms;
        self
    }

    #[must_use]
    pub const fn elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.record.elapsed_ms = elapsed_ms;
        self
    }

    #[must_use]
    pub const fn latency_ms(mut self, latency_ms: u64) -> Self {
        self.record.latency_ms = latency_ms;
        self
    }

    #[must_use]
    pub const fn connect_ms(mut self, connect_ms: u64) -> Self {
        self.record.connect_ms = connect_ms;
        self
    }

    #[must_use]
    pub const fn status_code(mut self, status_code: u16) -> Self {
        self.record.status_code = status_code;
        self
    }

    #[must_use]
    pub fn response_message(mut self, message: &str) -> Self {
        message.clone_into(&mut self.record.response_message);
        self
    }

    #[must_use]
    pub fn thread_name(mut self, thread_name: &str) -> Self {
        thread_name.clone_into(&mut self.record.thread_name);
        self
    }

    #[must_use]
    pub const fn success(mut self, success: bool) -> Self {
        self.record.success = success;
        self
    }

    #[must_use]
    pub fn error_message(mut self, error_message: Option<String>) -> Self {
        self.record.error_message = error_message;
        self
    }

    #[must_use]
    pub const fn bytes(mut self, bytes: u64) -> Self {
        self.record.bytes = bytes;
        self
    }

    #[must_use]
    pub const fn sent_bytes(mut self, sent_bytes: u64) -> Self {
        self.record.sent_bytes = sent_bytes;
        self
    }

    #[must_use]
    pub const fn threads(mut self, group_threads: u64, all_threads: u64) -> Self {
        self.record.group_threads = group_threads;
        self.record.all_threads = all_threads;
        self
    }

    #[must_use]
    pub fn url(mut self, url: &str) -> Self {
        url.clone_into(&mut self.record.url);
        self
    }

    /// Freezes the record. A failed record without an explicit message gets
    /// its response message as the failure reason.
    #[must_use]
    pub fn build(self) -> ResultRecord {
        let mut record = self.record;
        if !record.success && record.error_message.is_none() && !record.response_message.is_empty()
        {
            record.error_message = Some(record.response_message.clone());
        }
        record
    }
}
