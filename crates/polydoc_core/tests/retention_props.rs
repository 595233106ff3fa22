//! Property tests for version numbering and retention.

use polydoc_core::{NewVersion, Status};
use polydoc_testkit::prelude::*;
use proptest::prelude::*;
use std::collections::BTreeMap;

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    /// After any number of saves a partition holds the newest
    /// `min(saves, cap)` versions, numbered without gaps.
    #[test]
    fn partition_keeps_the_newest_versions(saves in 1u64..30, cap in 1u32..10) {
        let t = TestStore::with_max_versions(cap);
        for _ in 0..saves {
            t.versions
                .create_version(NewVersion::new("doc-1", "post", field_map([("title", "x")])))
                .unwrap();
        }

        let kept: Vec<u64> = t
            .versions
            .find_versions_by_locale("doc-1", "post", "en")
            .unwrap()
            .iter()
            .map(|v| v.version_number)
            .collect();
        let expected_len = saves.min(u64::from(cap));
        let expected: Vec<u64> = (saves - expected_len + 1..=saves).rev().collect();
        prop_assert_eq!(kept, expected);
    }

    /// Numbers in each locale count up from 1 regardless of how saves in
    /// different locales interleave, and status changes never renumber.
    #[test]
    fn numbering_follows_each_locale(ops in operation_sequence_strategy(1, 40)) {
        let t = TestStore::with_max_versions(0);
        let mut saves: BTreeMap<String, u64> = BTreeMap::new();

        for op in ops {
            match op {
                VersionOperation::Save { locale, data } => {
                    let v = t
                        .versions
                        .create_version(NewVersion::new("doc-1", "post", data).locale(&locale))
                        .unwrap();
                    let count = saves.entry(locale).or_insert(0);
                    *count += 1;
                    prop_assert_eq!(v.version_number, *count);
                }
                VersionOperation::PublishLatest { locale } => {
                    let latest = t
                        .versions
                        .find_latest_version("doc-1", "post", &locale, None)
                        .unwrap();
                    if let Some(latest) = latest {
                        let result = t.versions.publish_version(&latest.id.to_string());
                        prop_assert_eq!(result.is_some(), latest.status == Status::Draft);
                    }
                }
                VersionOperation::ArchiveLatest { locale } => {
                    let latest = t
                        .versions
                        .find_latest_version("doc-1", "post", &locale, None)
                        .unwrap();
                    if let Some(latest) = latest {
                        let result = t.versions.archive_version(&latest.id.to_string());
                        prop_assert_eq!(result.is_some(), latest.status == Status::Published);
                    }
                }
            }
        }

        for (locale, count) in &saves {
            let numbers: Vec<u64> = t
                .versions
                .find_versions_by_locale("doc-1", "post", locale)
                .unwrap()
                .iter()
                .map(|v| v.version_number)
                .collect();
            prop_assert_eq!(numbers, (1..=*count).rev().collect::<Vec<_>>());
        }
    }

    /// Localized values resolve to the requested locale, then the default,
    /// then the kind's zero value.
    #[test]
    fn localized_reads_fall_back(value in localized_value_strategy(), locale in locale_strategy()) {
        use polydoc_core::locale::resolve;
        use polydoc_core::FieldKind;
        use polydoc_storage::Value;

        let map = value.as_map().unwrap();
        let resolved = resolve(&value, &locale, "en", FieldKind::Text);
        let expected = map
            .get(&locale)
            .or_else(|| map.get("en"))
            .cloned()
            .unwrap_or_else(|| Value::Text(String::new()));
        prop_assert_eq!(resolved, expected);
    }
}
