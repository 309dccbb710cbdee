//! In-memory ledger for tests
//!
//! [`ScriptedTransport`] records every request and answers from per-function
//! scripts. Once a script is exhausted, queries answer `200 []` and invokes
//! answer `201`.

use crate::request::{ChaincodeFunction, LedgerRequest};
use crate::response::LedgerResponse;
use crate::transport::LedgerTransport;
use async_trait::async_trait;
use ledgerprep_core::{
    constants::{STATUS_CREATED, STATUS_OK},
    Error, Result,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

/// Scripted answer to one ledger call
#[derive(Debug, Clone)]
pub enum Scripted {
    /// The ledger answers with this status and body
    Status(u16, Value),
    /// The ledger cannot be reached
    Unreachable,
}

#[derive(Debug, Default)]
pub struct ScriptedTransport {
    queries: Mutex<VecDeque<Scripted>>,
    invokes: Mutex<HashMap<ChaincodeFunction, VecDeque<Scripted>>>,
    queried: Mutex<Vec<LedgerRequest>>,
    invoked: Mutex<Vec<LedgerRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next query with `answer`
    pub fn push_query(&self, answer: Scripted) {
        self.queries.lock().push_back(answer);
    }

    /// Answer the next invoke of `function` with `answer`
    pub fn push_invoke(&self, function: ChaincodeFunction, answer: Scripted) {
        self.invokes
            .lock()
            .entry(function)
            .or_default()
            .push_back(answer);
    }

    pub fn queried(&self) -> Vec<LedgerRequest> {
        self.queried.lock().clone()
    }

    pub fn invoked(&self) -> Vec<LedgerRequest> {
        self.invoked.lock().clone()
    }

    /// Invokes of a single chaincode function, in call order
    pub fn invoked_with(&self, function: ChaincodeFunction) -> Vec<LedgerRequest> {
        self.invoked
            .lock()
            .iter()
            .filter(|r| r.function() == function)
            .cloned()
            .collect()
    }

    fn answer(script: Option<Scripted>, default_status: u16, default_body: Value) -> Result<LedgerResponse> {
        match script {
            Some(Scripted::Status(status, body)) => Ok(LedgerResponse::new(status, body)),
            Some(Scripted::Unreachable) => Err(Error::transport("scripted", "ledger unreachable")),
            None => Ok(LedgerResponse::new(default_status, default_body)),
        }
    }
}

#[async_trait]
impl LedgerTransport for ScriptedTransport {
    async fn query(&self, request: &LedgerRequest) -> Result<LedgerResponse> {
        self.queried.lock().push(request.clone());
        let script = self.queries.lock().pop_front();
        Self::answer(script, STATUS_OK, Value::Array(Vec::new()))
    }

    async fn invoke(&self, request: &LedgerRequest) -> Result<LedgerResponse> {
        self.invoked.lock().push(request.clone());
        let script = self
            .invokes
            .lock()
            .get_mut(&request.function())
            .and_then(VecDeque::pop_front);
        Self::answer(script, STATUS_CREATED, Value::Null)
    }
}
