//! Agent validation run used by `snmp-validate`.
//!
//! Exercises GET, WALK and BULK against an agent, plus an opt-in SET, and
//! collects a report that can be printed or written as JSON.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::client::Client;
use crate::oid;
use crate::oid::Oid;
use crate::value::Value;
use crate::varbind::VarBind;

/// Overall success rate (percent) at or above which a run passes.
pub const PASS_THRESHOLD: f64 = 80.0;

/// System group scalars fetched by [`Validator::run_standard`].
pub const SYSTEM_GROUP: [(&str, [u32; 9]); 7] = [
    ("sysDescr", [1, 3, 6, 1, 2, 1, 1, 1, 0]),
    ("sysObjectID", [1, 3, 6, 1, 2, 1, 1, 2, 0]),
    ("sysUpTime", [1, 3, 6, 1, 2, 1, 1, 3, 0]),
    ("sysContact", [1, 3, 6, 1, 2, 1, 1, 4, 0]),
    ("sysName", [1, 3, 6, 1, 2, 1, 1, 5, 0]),
    ("sysLocation", [1, 3, 6, 1, 2, 1, 1, 6, 0]),
    ("sysServices", [1, 3, 6, 1, 2, 1, 1, 7, 0]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Get,
    Walk,
    Set,
    Bulk,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Get,
        Operation::Walk,
        Operation::Set,
        Operation::Bulk,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::Get => "GET",
            Operation::Walk => "WALK",
            Operation::Set => "SET",
            Operation::Bulk => "BULK",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValueEntry {
    pub oid: String,
    pub value: String,
}

impl From<&VarBind> for ValueEntry {
    fn from(vb: &VarBind) -> Self {
        Self {
            oid: vb.oid.to_string(),
            value: plain_text(&vb.value),
        }
    }
}

/// Report form of a value: text strings unquoted, everything else as
/// displayed.
fn plain_text(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

/// SMI type name recorded for a SET.
fn set_type(value: &Value) -> &'static str {
    match value {
        Value::OctetString(_) => "OctetString",
        Value::Integer(_) => "Integer",
        Value::IpAddress(_) => "IpAddress",
        Value::ObjectIdentifier(_) => "ObjectIdentifier",
        other => other.type_name(),
    }
}

/// Outcome of a single operation.
///
/// GET and SET name their object in `oid`; WALK and BULK name their subtree
/// in `oid_prefix` and list what came back in `values`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub operation: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oid_prefix: Option<String>,
    pub success: bool,
    /// Value read by a GET or written by a SET.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// SMI type of the value written by a SET.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<ValueEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_repetitions: Option<i32>,
    pub error: Option<String>,
}

impl CheckResult {
    fn new(operation: Operation) -> Self {
        Self {
            operation,
            oid: None,
            oid_prefix: None,
            success: false,
            value: None,
            value_type: None,
            count: None,
            values: None,
            max_repetitions: None,
            error: None,
        }
    }

    fn scalar(operation: Operation, oid: &Oid) -> Self {
        Self {
            oid: Some(oid.to_string()),
            ..Self::new(operation)
        }
    }

    fn subtree(operation: Operation, prefix: &Oid) -> Self {
        Self {
            oid_prefix: Some(prefix.to_string()),
            count: Some(0),
            values: Some(Vec::new()),
            ..Self::new(operation)
        }
    }

    /// The object or subtree this check addressed.
    pub fn subject(&self) -> &str {
        self.oid
            .as_deref()
            .or(self.oid_prefix.as_deref())
            .unwrap_or_default()
    }

    fn record(&mut self, varbinds: &[VarBind]) {
        let values = self.values.get_or_insert_with(Vec::new);
        values.extend(varbinds.iter().map(ValueEntry::from));
        self.count = Some(values.len());
    }
}

/// Pass counts for one operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperationSummary {
    pub operation: Operation,
    pub total: usize,
    pub passed: usize,
}

impl OperationSummary {
    pub fn success_rate(&self) -> f64 {
        rate(self.passed, self.total)
    }
}

fn rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64 * 100.0
    }
}

/// Everything a validation run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// When the run started, serialized as RFC 3339.
    pub timestamp: DateTime<Utc>,
    pub host: String,
    pub port: u16,
    pub tests: Vec<CheckResult>,
}

impl ValidationReport {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            timestamp: Utc::now(),
            host: host.into(),
            port,
            tests: Vec::new(),
        }
    }

    pub fn passed(&self) -> usize {
        self.tests.iter().filter(|t| t.success).count()
    }

    pub fn success_rate(&self) -> f64 {
        rate(self.passed(), self.tests.len())
    }

    /// Whether the run meets [`PASS_THRESHOLD`].
    pub fn is_success(&self) -> bool {
        !self.tests.is_empty() && self.success_rate() >= PASS_THRESHOLD
    }

    /// Per-operation counts, skipping operations that never ran.
    pub fn summary(&self) -> Vec<OperationSummary> {
        Operation::ALL
            .iter()
            .filter_map(|&operation| {
                let runs = self.tests.iter().filter(|t| t.operation == operation);
                let (total, passed) =
                    runs.fold((0, 0), |(total, passed), t| (total + 1, passed + t.success as usize));
                (total > 0).then_some(OperationSummary {
                    operation,
                    total,
                    passed,
                })
            })
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Runs checks against one agent.
///
/// Reads go through `reader`. SETs go through the client given to
/// [`Validator::with_writer`] (normally the same agent with a write
/// community), falling back to `reader`.
pub struct Validator {
    reader: Client,
    writer: Option<Client>,
    report: ValidationReport,
}

impl Validator {
    /// `host` is recorded in the report as given, before resolution.
    pub fn new(host: impl Into<String>, reader: Client) -> Self {
        let report = ValidationReport::new(host, reader.target().port());
        Self {
            reader,
            writer: None,
            report,
        }
    }

    pub fn with_writer(mut self, writer: Client) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn into_report(self) -> ValidationReport {
        self.report
    }

    fn push(&mut self, result: CheckResult) -> bool {
        let success = result.success;
        tracing::debug!(
            target: "snmp_trapkit::client",
            operation = result.operation.name(),
            oid = result.subject(),
            success,
            error = result.error.as_deref(),
            "check finished"
        );
        self.report.tests.push(result);
        success
    }

    pub async fn check_get(&mut self, oid: &Oid) -> bool {
        let mut result = CheckResult::scalar(Operation::Get, oid);
        match self.reader.get(oid).await {
            Ok(vb) if vb.value.is_exception() => {
                result.error = Some(format!("{} at {}", vb.value, vb.oid));
            }
            Ok(vb) => {
                result.value = Some(plain_text(&vb.value));
                result.success = true;
            }
            Err(e) => result.error = Some(e.to_string()),
        }
        self.push(result)
    }

    pub async fn check_walk(&mut self, prefix: &Oid) -> bool {
        let mut result = CheckResult::subtree(Operation::Walk, prefix);
        match self.reader.walk(prefix.clone()).await {
            Ok(varbinds) => {
                result.record(&varbinds);
                result.success = !varbinds.is_empty();
            }
            Err(e) => result.error = Some(e.to_string()),
        }
        self.push(result)
    }

    pub async fn check_set(&mut self, oid: &Oid, value: Value) -> bool {
        let mut result = CheckResult::scalar(Operation::Set, oid);
        result.value = Some(plain_text(&value));
        result.value_type = Some(set_type(&value));
        let client = self.writer.as_ref().unwrap_or(&self.reader);
        match client.set(oid, value).await {
            Ok(_) => result.success = true,
            Err(e) => result.error = Some(e.to_string()),
        }
        self.push(result)
    }

    pub async fn check_bulk(&mut self, prefix: &Oid, max_repetitions: i32) -> bool {
        let mut result = CheckResult::subtree(Operation::Bulk, prefix);
        result.max_repetitions = Some(max_repetitions);
        match self.reader.bulk(prefix.clone(), max_repetitions).await {
            Ok(bulk) => {
                result.record(&bulk.varbinds);
                result.success = !bulk.varbinds.is_empty();
            }
            Err(e) => result.error = Some(e.to_string()),
        }
        self.push(result)
    }

    /// The standard read-only run: system group GETs, an ifTable walk and a
    /// 25-repetition BULK under mib-2. With `set_contact`, sysContact.0 is
    /// also written through the writer.
    pub async fn run_standard(&mut self, set_contact: Option<&str>) -> &ValidationReport {
        for (name, arcs) in SYSTEM_GROUP {
            let ok = self.check_get(&Oid::from_slice(&arcs)).await;
            tracing::info!(target: "snmp_trapkit::client", object = name, ok, "system group");
        }
        self.check_walk(&oid!(1, 3, 6, 1, 2, 1, 2, 2, 1)).await;
        if let Some(contact) = set_contact {
            self.check_set(&oid!(1, 3, 6, 1, 2, 1, 1, 4, 0), Value::from(contact))
                .await;
        }
        self.check_bulk(&oid!(1, 3, 6, 1, 2, 1), 25).await;
        &self.report
    }
}
