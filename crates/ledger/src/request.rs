//! Typed chaincode requests
//!
//! A request is a function name followed by string arguments. It serialises
//! to the ledger wire form `{"Args":["<function>", "<arg1>", ...]}`.

use ledgerprep_core::constants::TASK_FILTER_INDEX;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::fmt;

/// Chaincode functions this node calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChaincodeFunction {
    RegisterData,
    QueryFilter,
    LogStartTrainTest,
    LogFailTrainTest,
    CreateTesttuple,
}

impl ChaincodeFunction {
    pub fn as_str(self) -> &'static str {
        match self {
            ChaincodeFunction::RegisterData => "registerData",
            ChaincodeFunction::QueryFilter => "queryFilter",
            ChaincodeFunction::LogStartTrainTest => "logStartTrainTest",
            ChaincodeFunction::LogFailTrainTest => "logFailTrainTest",
            ChaincodeFunction::CreateTesttuple => "createTesttuple",
        }
    }
}

impl fmt::Display for ChaincodeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chaincode invocation with ordered string arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRequest {
    function: ChaincodeFunction,
    args: Vec<String>,
}

impl LedgerRequest {
    pub fn new(function: ChaincodeFunction) -> Self {
        Self {
            function,
            args: Vec::new(),
        }
    }

    /// Append a single argument
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Append a list-valued argument, comma-joined
    pub fn list_arg<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.args.push(joined);
        self
    }

    pub fn function(&self) -> ChaincodeFunction {
        self.function
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Tasks assigned to `worker` that currently have `status`
    pub fn query_tasks(worker: &str, status: &str) -> Self {
        Self::new(ChaincodeFunction::QueryFilter)
            .arg(TASK_FILTER_INDEX)
            .list_arg([worker, status])
    }

    /// Move a task to `status`
    pub fn log_start(task_key: &str, status: &str) -> Self {
        Self::new(ChaincodeFunction::LogStartTrainTest)
            .arg(task_key)
            .arg(status)
    }

    /// Mark a task failed with a reason every participant can read
    pub fn log_fail(task_key: &str, message: &str) -> Self {
        Self::new(ChaincodeFunction::LogFailTrainTest)
            .arg(task_key)
            .arg("failed")
            .arg(message)
    }

    /// Register data samples against one or more datasets
    pub fn register_data<K, D>(data_keys: K, dataset_keys: D, test_only: bool) -> Self
    where
        K: IntoIterator,
        K::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        Self::new(ChaincodeFunction::RegisterData)
            .list_arg(data_keys)
            .list_arg(dataset_keys)
            .arg(test_only.to_string())
    }

    /// Create a test task for an existing train task
    pub fn create_testtuple<D>(traintuple_key: &str, dataset_key: &str, data_keys: D) -> Self
    where
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        Self::new(ChaincodeFunction::CreateTesttuple)
            .arg(traintuple_key)
            .arg(dataset_key)
            .list_arg(data_keys)
    }

    /// Wire payload as a JSON value
    pub fn to_payload(&self) -> serde_json::Value {
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(serde_json::Value::String(self.function.as_str().to_string()));
        args.extend(self.args.iter().cloned().map(serde_json::Value::String));
        serde_json::json!({ "Args": args })
    }
}

struct ArgsList<'a>(&'a LedgerRequest);

impl Serialize for ArgsList<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.args.len() + 1))?;
        seq.serialize_element(self.0.function.as_str())?;
        for arg in &self.0.args {
            seq.serialize_element(arg)?;
        }
        seq.end()
    }
}

impl Serialize for LedgerRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("Args", &ArgsList(self))?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_to_args_payload() {
        let request = LedgerRequest::log_start("abc", "training");

        let json = serde_json::to_string(&request).unwrap();

        assert_eq!(json, r#"{"Args":["logStartTrainTest","abc","training"]}"#);
        assert_eq!(serde_json::to_value(&request).unwrap(), request.to_payload());
    }

    #[test]
    fn test_query_filter_joins_worker_and_status() {
        let request = LedgerRequest::query_tasks("owner", "todo");

        assert_eq!(request.function(), ChaincodeFunction::QueryFilter);
        assert_eq!(
            request.args(),
            &["traintuple~trainWorker~status".to_string(), "owner,todo".to_string()]
        );
    }

    #[test]
    fn test_quotes_in_arguments_are_escaped() {
        let request = LedgerRequest::log_fail("abc", r#"hash "H1" mismatch"#);

        let json = serde_json::to_string(&request).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["Args"][3], r#"hash "H1" mismatch"#);
        assert_eq!(parsed["Args"][2], "failed");
    }

    #[test]
    fn test_register_data_argument_order() {
        let request = LedgerRequest::register_data(["k1", "k2"], ["ds"], false);

        assert_eq!(
            request.to_payload(),
            serde_json::json!({"Args": ["registerData", "k1,k2", "ds", "false"]})
        );
    }

    #[test]
    fn test_create_testtuple_argument_order() {
        let request = LedgerRequest::create_testtuple("t", "ds", Vec::<String>::new());

        assert_eq!(
            request.to_payload(),
            serde_json::json!({"Args": ["createTesttuple", "t", "ds", ""]})
        );
    }
}
