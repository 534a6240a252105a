//! Cross-environment equivalence of applications and subscriptions.
//!
//! Records pulled from two environments never agree on generated identifiers,
//! so those are overwritten with a shared placeholder before comparing.

use serde::Serialize;
use serde_json::Value;

use crate::model::{Application, Subscription, SubscriptionList};

const SAME: &str = "override_with_same_value";

/// What the import was told to leave out
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompareOptions {
    pub skip_subscriptions: bool,
    /// Keys were exported and are checked separately
    pub with_keys: bool,
}

pub fn normalize_application(app: &Application, options: CompareOptions) -> Application {
    let mut copy = app.clone();
    copy.application_id = SAME.to_string();
    if options.skip_subscriptions {
        copy.subscription_count = 0;
        copy.subscription_scopes = vec![Value::String(SAME.to_string())];
    }
    if options.with_keys {
        copy.keys = Vec::new();
    }
    copy
}

pub fn normalize_subscriptions(subscriptions: &SubscriptionList) -> SubscriptionList {
    let mut list: Vec<Subscription> = subscriptions
        .list
        .iter()
        .cloned()
        .map(|mut s| {
            s.subscription_id = SAME.to_string();
            s.api_id = SAME.to_string();
            s.application_id = SAME.to_string();
            s
        })
        .collect();
    list.sort_by_key(sort_key);
    SubscriptionList {
        count: subscriptions.count,
        list,
    }
}

fn sort_key<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// Names of the top-level fields that differ after normalizing
pub fn application_differences(
    a: &Application,
    b: &Application,
    options: CompareOptions,
) -> Vec<String> {
    let left = serde_json::to_value(normalize_application(a, options)).unwrap_or(Value::Null);
    let right = serde_json::to_value(normalize_application(b, options)).unwrap_or(Value::Null);
    field_differences(&left, &right)
}

pub fn subscription_differences(a: &SubscriptionList, b: &SubscriptionList) -> Vec<String> {
    let left = normalize_subscriptions(a);
    let right = normalize_subscriptions(b);
    let mut diffs = Vec::new();
    if left.count != right.count {
        diffs.push(format!("count ({} != {})", left.count, right.count));
    }
    if left.list.len() != right.list.len() {
        diffs.push(format!("list length ({} != {})", left.list.len(), right.list.len()));
        return diffs;
    }
    for (i, (l, r)) in left.list.iter().zip(right.list.iter()).enumerate() {
        let lv = serde_json::to_value(l).unwrap_or(Value::Null);
        let rv = serde_json::to_value(r).unwrap_or(Value::Null);
        for field in field_differences(&lv, &rv) {
            diffs.push(format!("list[{i}].{field}"));
        }
    }
    diffs
}

fn field_differences(left: &Value, right: &Value) -> Vec<String> {
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => {
            let mut keys: Vec<&String> = l.keys().chain(r.keys()).collect();
            keys.sort();
            keys.dedup();
            keys.into_iter()
                .filter(|k| l.get(*k) != r.get(*k))
                .cloned()
                .collect()
        }
        _ if left == right => Vec::new(),
        _ => vec!["<root>".to_string()],
    }
}

pub fn applications_match(a: &Application, b: &Application, options: CompareOptions) -> bool {
    application_differences(a, b, options).is_empty()
}

pub fn subscriptions_match(a: &SubscriptionList, b: &SubscriptionList) -> bool {
    subscription_differences(a, b).is_empty()
}
