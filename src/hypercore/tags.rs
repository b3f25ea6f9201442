//! VM tags
//!
//! Tags are stored server-side as a single comma-joined string. There is no
//! partial update: every change reads the whole list, edits it locally, and
//! writes the full replacement back to `VirDomain/{uuid}`.

use super::client::HyperCoreClient;
use super::error::{Error, Result};
use super::http::segment;
use super::selector::{TagMethod, VmSelector};
use super::session::Session;
use super::task::{task_tag_from, TaskTag};
use super::vms::{get_vm, list_vms, VirtualMachine};
use serde_json::json;
use std::collections::BTreeMap;

/// Split a comma-joined tag string into elements, dropping empty ones
pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Join tag elements back into the stored form
pub fn join_tags(tags: &[String]) -> String {
    tags.join(",")
}

/// Apply a tag change to a list and return the new list
///
/// `Manual` ignores `current` and yields `value` as the sole, unparsed entry,
/// so joining it writes `value` verbatim.
pub fn apply_tag_change(current: &[String], method: TagMethod, value: &str) -> Result<Vec<String>> {
    if method != TagMethod::Manual && (value.is_empty() || value.contains(',')) {
        return Err(Error::InvalidArgument(format!(
            "'{}' is not a single tag",
            value
        )));
    }

    let without: Vec<String> = current.iter().filter(|t| *t != value).cloned().collect();

    match method {
        TagMethod::Add => {
            let mut tags = current.to_vec();
            if without.len() == current.len() {
                tags.push(value.to_string());
            } else {
                tracing::debug!("Tag {} already present, not adding a duplicate", value);
            }
            Ok(tags)
        }
        TagMethod::Remove => {
            if without.len() == current.len() {
                return Err(Error::NotFound(format!("tag '{}'", value)));
            }
            Ok(without)
        }
        TagMethod::Group => {
            let mut tags = Vec::with_capacity(without.len() + 1);
            tags.push(value.to_string());
            tags.extend(without);
            Ok(tags)
        }
        TagMethod::Manual => Ok(vec![value.to_string()]),
    }
}

/// VMs carrying `tag` as an exact element, keyed by name
pub fn vms_with_tag(vms: &[VirtualMachine], tag: &str) -> BTreeMap<String, String> {
    vms.iter()
        .filter(|vm| split_tags(&vm.tags).iter().any(|t| t == tag))
        .map(|vm| (vm.name.clone(), vm.uuid.clone()))
        .collect()
}

/// Find every VM carrying `tag`; an empty map when none do
pub async fn find_by_tag(
    client: &HyperCoreClient,
    session: &Session,
    tag: &str,
) -> Result<BTreeMap<String, String>> {
    let vms = list_vms(client, session).await?;
    let found = vms_with_tag(&vms, tag);
    tracing::debug!("{} virtual machines tagged {}", found.len(), tag);
    Ok(found)
}

/// Change a VM's tags and write the full list back
///
/// Returns the task tag of the update when the cluster reports one.
pub async fn change_tags(
    client: &HyperCoreClient,
    session: &Session,
    selector: &VmSelector,
    method: TagMethod,
    value: &str,
) -> Result<Option<TaskTag>> {
    let vm = get_vm(client, session, selector).await?;
    let tags = apply_tag_change(&vm.tag_list(), method, value)?;
    let joined = join_tags(&tags);

    tracing::info!("Setting tags of {} to '{}' ({:?})", vm.name, joined, method);

    let response = client
        .http
        .post(
            &format!("VirDomain/{}", segment(&vm.uuid)),
            session,
            Some(&json!({ "tags": joined })),
        )
        .await?;

    Ok(task_tag_from(&response))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(tags: &str) -> Vec<String> {
        split_tags(tags)
    }

    #[test]
    fn test_split_drops_empty() {
        assert!(split_tags("").is_empty());
        assert_eq!(split_tags("a,,b"), vec!["a", "b"]);
    }

    #[test]
    fn test_add_appends() {
        let tags = apply_tag_change(&list("a,b"), TagMethod::Add, "c").unwrap();
        assert_eq!(join_tags(&tags), "a,b,c");
    }

    #[test]
    fn test_add_existing_is_noop() {
        let tags = apply_tag_change(&list("a,b"), TagMethod::Add, "a").unwrap();
        assert_eq!(join_tags(&tags), "a,b");
    }

    #[test]
    fn test_remove_present() {
        let tags = apply_tag_change(&list("a,b,c"), TagMethod::Remove, "b").unwrap();
        assert_eq!(join_tags(&tags), "a,c");
    }

    #[test]
    fn test_remove_absent_is_not_found() {
        let err = apply_tag_change(&list("a,b"), TagMethod::Remove, "z").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_group_promotes_to_front() {
        let tags = apply_tag_change(&list("a,b,c"), TagMethod::Group, "c").unwrap();
        assert_eq!(join_tags(&tags), "c,a,b");

        let tags = apply_tag_change(&list("a,b"), TagMethod::Group, "x").unwrap();
        assert_eq!(join_tags(&tags), "x,a,b");
    }

    #[test]
    fn test_manual_is_verbatim() {
        let tags = apply_tag_change(&list("a,b"), TagMethod::Manual, "x,y,,z").unwrap();
        assert_eq!(join_tags(&tags), "x,y,,z");
    }

    #[test]
    fn test_rejects_multi_tag_value() {
        let err = apply_tag_change(&list("a"), TagMethod::Add, "b,c").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        let err = apply_tag_change(&list("a"), TagMethod::Group, "").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_vms_with_tag_exact_element() {
        let vms = vec![
            VirtualMachine {
                name: "a".to_string(),
                uuid: "u-a".to_string(),
                tags: "linux,prod".to_string(),
                ..Default::default()
            },
            VirtualMachine {
                name: "b".to_string(),
                uuid: "u-b".to_string(),
                tags: "linux-test".to_string(),
                ..Default::default()
            },
        ];
        let found = vms_with_tag(&vms, "linux");
        assert_eq!(found.len(), 1);
        assert_eq!(found.get("a").map(String::as_str), Some("u-a"));
        assert!(vms_with_tag(&vms, "windows").is_empty());
    }
    #[test]
    fn test_empty_tag_matches_nothing() {
        let vm = |name: &str, uuid: &str, tags: &str| VirtualMachine {
            name: name.to_string(),
            uuid: uuid.to_string(),
            tags: tags.to_string(),
            ..Default::default()
        };
        let vms = vec![
            vm("untagged", "u-1", ""),
            vm("tagged", "u-2", "prod"),
            vm("gap", "u-3", "a,,b"),
        ];
        assert!(vms_with_tag(&vms, "").is_empty());
        assert_eq!(vms_with_tag(&vms, "b").get("gap").map(String::as_str), Some("u-3"));
    }
}
