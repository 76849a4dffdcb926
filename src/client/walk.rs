//! WALK and BULK retrieval.

use crate::error::{Error, ErrorStatus, Result, WalkAbortReason};
use crate::oid::Oid;
use crate::pdu::Pdu;
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;

use super::Client;

/// Result of [`Client::bulk`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BulkResponse {
    /// Varbinds up to, not including, the first `endOfMibView`.
    pub varbinds: Vec<VarBind>,
    /// The agent ran out of objects inside this response.
    pub end_of_mib_view: bool,
}

/// What a walk does with one GETNEXT answer.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Continue,
    Done,
    NonIncreasing,
}

fn classify(base: &Oid, previous: &Oid, vb: &VarBind) -> Step {
    if matches!(vb.value, Value::EndOfMibView) {
        return Step::Done;
    }
    if !vb.oid.starts_with(base) {
        return Step::Done;
    }
    if vb.oid <= *previous {
        return Step::NonIncreasing;
    }
    Step::Continue
}

impl Client {
    /// Walk the subtree under `oid` with repeated GETNEXT.
    ///
    /// Stops when the agent answers with an OID outside the subtree, with
    /// `endOfMibView`, or (v1) with `noSuchName`. Reaching the configured
    /// iteration cap logs a warning and returns what was collected. An agent
    /// that does not move forward aborts the walk with
    /// [`Error::WalkAborted`].
    #[tracing::instrument(skip(self), err, fields(snmp.target = %self.target(), snmp.oid = %oid))]
    pub async fn walk(&self, oid: Oid) -> Result<Vec<VarBind>> {
        let max_iterations = self.config().max_walk_iterations;
        let mut results = Vec::new();
        let mut current = oid.clone();

        for _ in 0..max_iterations {
            let response = match self
                .request(Pdu::get_next_request(0, std::slice::from_ref(&current)))
                .await
            {
                Ok(response) => response,
                Err(Error::Snmp {
                    status: ErrorStatus::NoSuchName,
                    ..
                }) if self.config().version == Version::V1 => {
                    tracing::debug!(target: "snmp_trapkit::client", "noSuchName ends v1 walk");
                    return Ok(results);
                }
                Err(e) => return Err(e),
            };

            let mut varbinds = response.varbinds;
            if varbinds.len() != 1 {
                return Err(Error::WalkAborted {
                    target: self.target(),
                    previous: current.clone(),
                    current,
                    reason: WalkAbortReason::WrongVarbindCount(varbinds.len()),
                });
            }
            let vb = varbinds.remove(0);

            match classify(&oid, &current, &vb) {
                Step::Done => return Ok(results),
                Step::NonIncreasing => {
                    tracing::warn!(
                        target: "snmp_trapkit::client",
                        { snmp.target = %self.target(),
                        previous = %current,
                        current = %vb.oid },
                        "agent returned non-increasing OID"
                    );
                    return Err(Error::WalkAborted {
                        target: self.target(),
                        previous: current,
                        current: vb.oid,
                        reason: WalkAbortReason::NonIncreasing,
                    });
                }
                Step::Continue => {
                    current = vb.oid.clone();
                    results.push(vb);
                }
            }
        }

        tracing::warn!(
            target: "snmp_trapkit::client",
            { snmp.target = %self.target(),
            snmp.oid = %oid,
            max_iterations,
            collected = results.len() },
            "walk stopped at iteration cap"
        );
        Ok(results)
    }

    /// One GETBULK from `oid` with no non-repeaters.
    ///
    /// The varbinds are cut at the first `endOfMibView`; whether one was seen
    /// is reported in [`BulkResponse::end_of_mib_view`].
    #[tracing::instrument(skip(self), err, fields(snmp.target = %self.target(), snmp.oid = %oid))]
    pub async fn bulk(&self, oid: Oid, max_repetitions: i32) -> Result<BulkResponse> {
        let mut varbinds = self
            .get_bulk(std::slice::from_ref(&oid), 0, max_repetitions)
            .await?;

        let end = varbinds
            .iter()
            .position(|vb| matches!(vb.value, Value::EndOfMibView));
        if let Some(pos) = end {
            varbinds.truncate(pos);
        }
        Ok(BulkResponse {
            varbinds,
            end_of_mib_view: end.is_some(),
        })
    }

    /// [`Client::bulk`] with the configured max-repetitions.
    pub async fn bulk_default(&self, oid: Oid) -> Result<BulkResponse> {
        self.bulk(oid, self.config().max_repetitions).await
    }
}
