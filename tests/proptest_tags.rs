//! Property-based tests using proptest
//!
//! These tests check tag editing, tag matching and name resolution against
//! randomized VM listings.

use hcctl::hypercore::tags::{apply_tag_change, join_tags, split_tags, vms_with_tag};
use hcctl::hypercore::vms::{find_vm_uuid, VirtualMachine};
use hcctl::hypercore::{Error, TagMethod};
use proptest::prelude::*;

fn arb_tag() -> impl Strategy<Value = String> {
    "[a-z]{1,6}(-[a-z]{1,4})?"
}

fn arb_tags() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_tag(), 0..8)
}

/// Generate a VM listing with unique uuids
fn arb_vms() -> impl Strategy<Value = Vec<VirtualMachine>> {
    prop::collection::vec(("[A-Za-z][A-Za-z0-9-]{0,12}", arb_tags()), 0..30).prop_map(|items| {
        items
            .into_iter()
            .enumerate()
            .map(|(i, (name, tags))| VirtualMachine {
                uuid: format!("uuid-{}", i),
                name,
                tags: join_tags(&tags),
                ..Default::default()
            })
            .collect()
    })
}

/// Flip the case of every other character
fn scramble_case(s: &str) -> String {
    s.chars()
        .enumerate()
        .map(|(i, c)| {
            if i % 2 == 0 {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect()
}

proptest! {
    /// Grouping twice gives the same list as grouping once
    #[test]
    fn group_is_idempotent(tags in arb_tags(), tag in arb_tag()) {
        let once = apply_tag_change(&tags, TagMethod::Group, &tag).unwrap();
        let twice = apply_tag_change(&once, TagMethod::Group, &tag).unwrap();
        prop_assert_eq!(&once, &twice);
    }

    /// Grouping puts the tag first and keeps the others in order
    #[test]
    fn group_promotes_and_preserves_order(tags in arb_tags(), tag in arb_tag()) {
        let grouped = apply_tag_change(&tags, TagMethod::Group, &tag).unwrap();
        prop_assert_eq!(&grouped[0], &tag);
        let rest: Vec<String> = tags.iter().filter(|t| **t != tag).cloned().collect();
        prop_assert_eq!(&grouped[1..], &rest[..]);
    }

    /// Removing an absent tag is a not-found error
    #[test]
    fn remove_absent_is_not_found(tags in arb_tags(), tag in arb_tag()) {
        prop_assume!(!tags.contains(&tag));
        let result = apply_tag_change(&tags, TagMethod::Remove, &tag);
        prop_assert!(matches!(result, Err(Error::NotFound(_))));
    }

    /// Removing a present tag leaves no copy of it
    #[test]
    fn remove_present_clears_tag(tags in arb_tags(), tag in arb_tag()) {
        let mut tags = tags;
        tags.push(tag.clone());
        let removed = apply_tag_change(&tags, TagMethod::Remove, &tag).unwrap();
        prop_assert!(!removed.contains(&tag));
    }

    /// Joining and splitting a tag list gives the list back
    #[test]
    fn split_inverts_join(tags in arb_tags()) {
        prop_assert_eq!(split_tags(&join_tags(&tags)), tags);
    }

    /// Tag matching selects exactly the VMs with the tag as an element
    #[test]
    fn tag_match_is_exact_element(vms in arb_vms(), tag in arb_tag()) {
        let found = vms_with_tag(&vms, &tag);
        for vm in &vms {
            let has_tag = split_tags(&vm.tags).contains(&tag);
            if has_tag {
                prop_assert!(found.contains_key(&vm.name));
            } else if !vms.iter().any(|o| o.name == vm.name && split_tags(&o.tags).contains(&tag)) {
                prop_assert!(!found.contains_key(&vm.name));
            }
        }
    }

    /// Name resolution is insensitive to case
    #[test]
    fn resolution_ignores_case(vms in arb_vms()) {
        for vm in &vms {
            let plain = find_vm_uuid(&vms, &vm.name);
            prop_assert!(plain.is_some());
            prop_assert_eq!(plain, find_vm_uuid(&vms, &vm.name.to_uppercase()));
            prop_assert_eq!(plain, find_vm_uuid(&vms, &vm.name.to_lowercase()));
            prop_assert_eq!(plain, find_vm_uuid(&vms, &scramble_case(&vm.name)));
        }
    }
}

#[test]
fn substring_tag_does_not_match() {
    let vms = vec![VirtualMachine {
        uuid: "u-1".to_string(),
        name: "test-box".to_string(),
        tags: "linux-test".to_string(),
        ..Default::default()
    }];
    assert!(vms_with_tag(&vms, "linux").is_empty());
    assert_eq!(vms_with_tag(&vms, "linux-test").len(), 1);
}
