//! VM snapshots

use super::client::HyperCoreClient;
use super::error::{Error, Result};
use super::selector::SnapshotTarget;
use super::session::Session;
use super::tags::find_by_tag;
use super::task::{task_tag_from, TaskTag};
use super::vms::resolve_vm_uuid;
use serde_json::json;

/// Result of snapshotting one VM
#[derive(Debug)]
pub struct SnapshotOutcome {
    /// VM name, when the target was resolved by name or tag
    pub name: Option<String>,
    pub uuid: String,
    pub result: Result<Option<TaskTag>>,
}

/// Take a snapshot of a single VM by uuid
pub async fn snapshot_uuid(
    client: &HyperCoreClient,
    session: &Session,
    uuid: &str,
    label: &str,
) -> Result<Option<TaskTag>> {
    tracing::info!("Snapshotting {} as '{}'", uuid, label);

    let body = json!({
        "domainUUID": uuid,
        "label": label,
    });
    let response = client
        .http
        .post("VirDomainSnapshot", session, Some(&body))
        .await?;

    Ok(task_tag_from(&response))
}

/// Take snapshots of the targeted VMs
///
/// Resolution failures (unknown name, tag on no VM) are returned before any
/// snapshot is requested. For tag targets every VM is attempted in turn; a
/// failure is logged and recorded in its outcome and does not stop the rest.
pub async fn snapshot(
    client: &HyperCoreClient,
    session: &Session,
    target: &SnapshotTarget,
    label: &str,
) -> Result<Vec<SnapshotOutcome>> {
    let tagged = match target {
        SnapshotTarget::Uuid(uuid) => {
            let task = snapshot_uuid(client, session, uuid, label).await?;
            return Ok(vec![SnapshotOutcome {
                name: None,
                uuid: uuid.clone(),
                result: Ok(task),
            }]);
        }
        SnapshotTarget::Name(name) => {
            let uuid = resolve_vm_uuid(client, session, name).await?;
            let task = snapshot_uuid(client, session, &uuid, label).await?;
            return Ok(vec![SnapshotOutcome {
                name: Some(name.clone()),
                uuid,
                result: Ok(task),
            }]);
        }
        SnapshotTarget::Tag(tag) => {
            let tagged = find_by_tag(client, session, tag).await?;
            if tagged.is_empty() {
                return Err(Error::EmptyResult(format!("tag '{}'", tag)));
            }
            tagged
        }
    };

    let mut outcomes = Vec::with_capacity(tagged.len());
    for (name, uuid) in tagged {
        let result = snapshot_uuid(client, session, &uuid, label).await;
        if let Err(e) = &result {
            tracing::warn!("Snapshot of {} failed: {}", name, e);
        }
        outcomes.push(SnapshotOutcome {
            name: Some(name),
            uuid,
            result,
        });
    }

    Ok(outcomes)
}
