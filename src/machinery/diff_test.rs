//! Tests for diff computation.

#[cfg(test)]
mod tests {
    use crate::api::{AuthInfo, Cluster, Config, Context};
    use crate::machinery::fixtures::{rekey, sample_config};
    use crate::machinery::{
        compute_diff, validate_config, ChangeKind, ChangeType, ComplexDiff, ComplexDiffType, ConfigSide, Diff, DiffItem,
        EntityKind, MachineryError, NamedContext,
    };
    use pretty_assertions::assert_eq;

    fn named(config: &Config, name: &str) -> NamedContext {
        NamedContext::new(name, &config.contexts[name])
    }

    fn modify(existing: &Config, incoming: &Config, name: &str, complex: ComplexDiffType) -> Diff {
        Diff::from(vec![DiffItem::modify(named(existing, name), named(incoming, name), complex)])
    }

    #[test]
    fn test_identical_configs_have_empty_diff() {
        for ids in [&[][..], &[1][..], &[1, 2, 3][..]] {
            let config = sample_config(ids);
            let diff = compute_diff(&config, &config).unwrap();
            assert!(diff.is_empty(), "expected no items for {:?}, got {}", ids, diff);
        }
    }

    #[test]
    fn test_adding_new_contexts() {
        let existing = sample_config(&[1]);
        let incoming = sample_config(&[1, 2]);

        let diff = compute_diff(&existing, &incoming).unwrap();
        assert_eq!(
            diff,
            Diff::from(vec![DiffItem {
                affected_existing: None,
                affected_incoming: Some(named(&incoming, "context2")),
                change_type: ChangeKind::New.into(),
                complex: ComplexDiffType::new(),
            }])
        );
    }

    #[test]
    fn test_deleting_contexts() {
        let existing = sample_config(&[1, 2]);
        let incoming = sample_config(&[1]);

        let diff = compute_diff(&existing, &incoming).unwrap();
        assert_eq!(
            diff,
            Diff::from(vec![DiffItem {
                affected_existing: Some(named(&existing, "context2")),
                affected_incoming: None,
                change_type: ChangeKind::Delete.into(),
                complex: ComplexDiffType::new(),
            }])
        );
    }

    #[test]
    fn test_rename() {
        let existing = sample_config(&[1, 2]);
        let mut incoming = sample_config(&[1, 2]);

        // Context name only.
        rekey(&mut incoming.contexts, "context2", "renamed");
        let diff = compute_diff(&existing, &incoming).unwrap();
        assert_eq!(
            diff,
            Diff::from(vec![DiffItem::rename(named(&existing, "context2"), named(&incoming, "renamed"))])
        );
        assert!(diff.items[0].complex.is_empty());

        // Context and cluster names.
        rekey(&mut incoming.clusters, "cluster2", "renamed");
        incoming.contexts.get_mut("renamed").unwrap().cluster = "renamed".to_string();
        let diff = compute_diff(&existing, &incoming).unwrap();
        assert_eq!(
            diff,
            Diff::from(vec![DiffItem::rename(named(&existing, "context2"), named(&incoming, "renamed"))])
        );

        // Every name.
        rekey(&mut incoming.auth_infos, "authInfo2", "renamed");
        incoming.contexts.get_mut("renamed").unwrap().auth_info = "renamed".to_string();
        let diff = compute_diff(&existing, &incoming).unwrap();
        assert_eq!(
            diff,
            Diff::from(vec![DiffItem::rename(named(&existing, "context2"), named(&incoming, "renamed"))])
        );
    }

    #[test]
    fn test_rename_of_cluster_under_same_context_name() {
        let existing = sample_config(&[1, 2]);
        let mut incoming = sample_config(&[1, 2]);
        rekey(&mut incoming.clusters, "cluster2", "newCluster2");
        incoming.contexts.get_mut("context2").unwrap().cluster = "newCluster2".to_string();

        let diff = compute_diff(&existing, &incoming).unwrap();
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.items[0].change_type, ChangeType::from(ChangeKind::Rename));
    }

    #[test]
    fn test_user_auth_change() {
        let existing = sample_config(&[1, 2]);
        let mut incoming = sample_config(&[1, 2]);
        incoming.auth_infos.get_mut("authInfo2").unwrap().client_certificate_data = b"newCert".to_vec();

        let diff = compute_diff(&existing, &incoming).unwrap();
        assert_eq!(
            diff,
            modify(&existing, &incoming, "context2", ComplexDiff::UserAuthChanged.into())
        );
        assert_eq!(diff.items[0].change_type, ChangeKind::Modify | ChangeKind::Complex);
    }

    #[test]
    fn test_cluster_ca_change() {
        let existing = sample_config(&[1, 2]);
        let mut incoming = sample_config(&[1, 2]);
        incoming.clusters.get_mut("cluster2").unwrap().certificate_authority_data = b"newCA".to_vec();

        let diff = compute_diff(&existing, &incoming).unwrap();
        assert_eq!(
            diff,
            modify(&existing, &incoming, "context2", ComplexDiff::ClusterCAChanged.into())
        );
    }

    #[test]
    fn test_server_url_change() {
        let existing = sample_config(&[1, 2]);
        let mut incoming = sample_config(&[1, 2]);
        incoming.clusters.get_mut("cluster2").unwrap().server = "newURL".to_string();

        let diff = compute_diff(&existing, &incoming).unwrap();
        assert_eq!(
            diff,
            modify(&existing, &incoming, "context2", ComplexDiff::ServerChanged.into())
        );
    }

    #[test]
    fn test_server_url_and_ca_change() {
        let existing = sample_config(&[1, 2]);
        let mut incoming = sample_config(&[1, 2]);
        let cluster = incoming.clusters.get_mut("cluster2").unwrap();
        cluster.server = "newURL".to_string();
        cluster.certificate_authority_data = b"newCA".to_vec();

        let diff = compute_diff(&existing, &incoming).unwrap();
        assert_eq!(
            diff,
            modify(
                &existing,
                &incoming,
                "context2",
                ComplexDiff::ClusterCAChanged | ComplexDiff::ServerChanged
            )
        );
    }

    #[test]
    fn test_server_url_and_user_auth_change() {
        let existing = sample_config(&[1, 2]);
        let mut incoming = sample_config(&[1, 2]);
        incoming.clusters.get_mut("cluster2").unwrap().server = "newURL".to_string();
        let auth_info = incoming.auth_infos.get_mut("authInfo2").unwrap();
        auth_info.client_certificate_data = b"newCert".to_vec();
        auth_info.client_key_data = b"newKey".to_vec();

        let diff = compute_diff(&existing, &incoming).unwrap();
        assert_eq!(
            diff,
            modify(
                &existing,
                &incoming,
                "context2",
                ComplexDiff::UserAuthChanged | ComplexDiff::ServerChanged
            )
        );
    }

    #[test]
    fn test_server_replacement() {
        let existing = sample_config(&[1, 2]);
        let mut incoming = sample_config(&[1, 2]);
        // Server URL stays the same
        incoming.clusters.get_mut("cluster2").unwrap().certificate_authority_data = b"newCA".to_vec();
        let auth_info = incoming.auth_infos.get_mut("authInfo2").unwrap();
        auth_info.client_certificate_data = b"newCert".to_vec();
        auth_info.client_key_data = b"newKey".to_vec();

        let diff = compute_diff(&existing, &incoming).unwrap();
        assert_eq!(
            diff,
            Diff::from(vec![DiffItem::replace(named(&existing, "context2"), named(&incoming, "context2"))])
        );
    }

    #[test]
    fn test_new_context_with_rename_required() {
        let existing = sample_config(&[1, 2]);
        let mut incoming = sample_config(&[1, 3]);
        rekey(&mut incoming.contexts, "context3", "context2");

        let diff = compute_diff(&existing, &incoming).unwrap();
        assert_eq!(
            diff,
            Diff::from(vec![
                DiffItem {
                    affected_existing: None,
                    affected_incoming: Some(named(&incoming, "context2")),
                    change_type: ChangeKind::New | ChangeKind::Complex,
                    complex: ComplexDiff::RenameRequired.into(),
                },
                DiffItem::delete(named(&existing, "context2")),
            ])
        );
    }

    #[test]
    fn test_all_names_collide() {
        let existing = sample_config(&[1, 2]);
        let mut incoming = sample_config(&[1, 2]);
        incoming
            .clusters
            .insert("cluster2".to_string(), Cluster::new("https://other:6443", b"otherCA".to_vec()));
        incoming.auth_infos.insert(
            "authInfo2".to_string(),
            AuthInfo {
                token: Some("other".to_string()),
                ..Default::default()
            },
        );

        let diff = compute_diff(&existing, &incoming).unwrap();
        assert_eq!(diff.len(), 2);
        assert_eq!(diff.items[0], DiffItem::new_context(named(&incoming, "context2"), true));
        assert_eq!(diff.items[1], DiffItem::delete(named(&existing, "context2")));
    }

    #[test]
    fn test_first_matching_context_wins() {
        let mut existing = Config::new();
        let shared = Cluster::new("https://shared:6443", b"sharedCA".to_vec());
        for name in ["b", "a"] {
            existing.clusters.insert(name.to_string(), shared.clone());
            existing.auth_infos.insert(
                name.to_string(),
                AuthInfo {
                    token: Some(name.to_string()),
                    ..Default::default()
                },
            );
            existing.contexts.insert(name.to_string(), Context::new(name, name));
        }

        let mut incoming = Config::new();
        incoming.clusters.insert("z".to_string(), shared);
        incoming.auth_infos.insert(
            "z".to_string(),
            AuthInfo {
                token: Some("z".to_string()),
                ..Default::default()
            },
        );
        incoming.contexts.insert("z".to_string(), Context::new("z", "z"));

        let diff = compute_diff(&existing, &incoming).unwrap();
        assert_eq!(
            diff,
            Diff::from(vec![
                DiffItem::modify(named(&existing, "a"), named(&incoming, "z"), ComplexDiff::UserAuthChanged.into()),
                DiffItem::delete(named(&existing, "b")),
            ])
        );
    }

    #[test]
    fn test_cluster_match_preferred_over_auth_match_on_other_context() {
        let existing = sample_config(&[1, 2]);
        let mut incoming = sample_config(&[1, 2]);
        incoming
            .clusters
            .insert("cluster3".to_string(), existing.clusters["cluster1"].clone());
        incoming
            .auth_infos
            .insert("authInfo3".to_string(), existing.auth_infos["authInfo2"].clone());
        incoming
            .contexts
            .insert("context3".to_string(), Context::new("cluster3", "authInfo3"));

        let diff = compute_diff(&existing, &incoming).unwrap();
        assert_eq!(
            diff,
            Diff::from(vec![DiffItem::modify(
                named(&existing, "context1"),
                named(&incoming, "context3"),
                ComplexDiff::UserAuthChanged.into()
            )])
        );
    }

    #[test]
    fn test_empty_ca_data_matches_empty_ca_data() {
        let mut existing = Config::new();
        existing.clusters.insert("a".to_string(), Cluster::new("https://a", Vec::new()));
        existing.auth_infos.insert(
            "a".to_string(),
            AuthInfo {
                token: Some("a".to_string()),
                ..Default::default()
            },
        );
        existing.contexts.insert("a".to_string(), Context::new("a", "a"));

        let mut incoming = Config::new();
        incoming.clusters.insert("b".to_string(), Cluster::new("https://b", Vec::new()));
        incoming.auth_infos.insert(
            "b".to_string(),
            AuthInfo {
                token: Some("b".to_string()),
                ..Default::default()
            },
        );
        incoming.contexts.insert("b".to_string(), Context::new("b", "b"));

        let diff = compute_diff(&existing, &incoming).unwrap();
        assert_eq!(
            diff,
            Diff::from(vec![DiffItem::modify(
                named(&existing, "a"),
                named(&incoming, "b"),
                ComplexDiff::UserAuthChanged | ComplexDiff::ServerChanged
            )])
        );
    }

    #[test]
    fn test_malformed_incoming_aborts() {
        let existing = sample_config(&[1]);
        let mut incoming = sample_config(&[1]);
        incoming
            .contexts
            .insert("broken".to_string(), Context::new("missing", "authInfo1"));

        let err = compute_diff(&existing, &incoming).unwrap_err();
        assert_eq!(
            err,
            MachineryError::malformed(ConfigSide::Incoming, "broken", EntityKind::Cluster, "missing")
        );
    }

    #[test]
    fn test_malformed_existing_aborts() {
        let mut existing = sample_config(&[1, 2]);
        existing.contexts.get_mut("context1").unwrap().auth_info = "nobody".to_string();
        let incoming = sample_config(&[1, 2]);

        let err = compute_diff(&existing, &incoming).unwrap_err();
        assert_eq!(
            err,
            MachineryError::malformed(ConfigSide::Existing, "context1", EntityKind::AuthInfo, "nobody")
        );
        assert!(validate_config(&existing, ConfigSide::Existing).is_err());
        assert!(validate_config(&incoming, ConfigSide::Incoming).is_ok());
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let existing = sample_config(&[1, 2]);
        let mut incoming = sample_config(&[2, 3]);
        incoming.clusters.get_mut("cluster2").unwrap().server = "newURL".to_string();
        let (existing_before, incoming_before) = (existing.clone(), incoming.clone());

        compute_diff(&existing, &incoming).unwrap();
        assert_eq!(existing, existing_before);
        assert_eq!(incoming, incoming_before);
    }

    #[test]
    fn test_diff_items_hold_copies() {
        let mut existing = sample_config(&[1, 2]);
        let mut incoming = sample_config(&[1, 2]);
        rekey(&mut incoming.contexts, "context2", "renamed");

        let diff = compute_diff(&existing, &incoming).unwrap();
        existing.contexts.get_mut("context2").unwrap().cluster = "elsewhere".to_string();

        let item = &diff.items[0];
        assert_eq!(item.affected_existing.as_ref().unwrap().cluster(), "cluster2");
    }
}
