use std::collections::HashMap;

use indexmap::IndexMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

use override_trigger::config::TriggerConfig;
use override_trigger::eval::{MatchContext, MatchReason, MatchResult, Trigger, render};
use override_trigger::resolve::{BuildOverride, OverrideResolver, OverrideTarget, ResolveError};
use override_trigger::sources::{
    Member, Message, MessageTextSources, SourceFlags, SourceKind, TextSourceEnumerator, User,
};

// ── Fixtures ──

/// Uppercase alphanumeric words are signatures.
fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| {
            !w.is_empty()
                && w.chars().any(|c| c.is_ascii_digit())
                && w.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        })
        .map(str::to_string)
        .collect()
}

/// Resolver over a fixed table that records every signature it is asked for.
#[derive(Default)]
struct RecordingResolver {
    table: HashMap<String, BuildOverride>,
    failing: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl RecordingResolver {
    fn with(mut self, signature: &str, targets: &[(&str, OverrideTarget)]) -> Self {
        let targets: IndexMap<String, OverrideTarget> = targets
            .iter()
            .map(|(p, t)| (p.to_string(), t.clone()))
            .collect();
        self.table
            .insert(signature.to_string(), BuildOverride::from_targets(targets));
        self
    }

    fn failing_on(mut self, signature: &str) -> Self {
        self.failing.push(signature.to_string());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OverrideResolver for RecordingResolver {
    async fn resolve(&self, signature: &str) -> Result<Option<BuildOverride>, ResolveError> {
        self.calls.lock().unwrap().push(signature.to_string());
        if self.failing.iter().any(|s| s == signature) {
            return Err(ResolveError::Unavailable(format!("backend down for {signature}")));
        }
        Ok(self.table.get(signature).cloned())
    }
}

/// Enumerator over fixed items that counts how many were pulled.
struct ScriptedSources {
    items: Vec<(SourceKind, String)>,
    pulled: Arc<AtomicUsize>,
}

impl TextSourceEnumerator for ScriptedSources {
    fn sources<'a>(
        &'a self,
        _message: &'a Message,
        _flags: SourceFlags,
    ) -> BoxStream<'a, (SourceKind, String)> {
        let pulled = Arc::clone(&self.pulled);
        stream::iter(self.items.clone())
            .inspect(move |_| {
                pulled.fetch_add(1, Ordering::SeqCst);
            })
            .boxed()
    }
}

fn message(content: &str) -> Message {
    Message {
        id: "100".into(),
        channel_id: "200".into(),
        content: content.into(),
        embeds: vec![],
        author: User {
            id: "300".into(),
            username: "mallory".into(),
            discriminator: "0".into(),
            global_name: None,
        },
    }
}

fn list(items: &[&str]) -> Option<Vec<String>> {
    Some(items.iter().map(|s| s.to_string()).collect())
}

fn trigger(config: TriggerConfig, resolver: &Arc<RecordingResolver>) -> Trigger {
    Trigger::new(config, Arc::clone(resolver)).with_extractor(tokens)
}

async fn evaluate(
    config: TriggerConfig,
    resolver: RecordingResolver,
    content: &str,
) -> (Option<MatchResult>, Vec<String>) {
    let resolver = Arc::new(resolver);
    let msg = message(content);
    let result = trigger(config, &resolver)
        .evaluate(Some(&msg))
        .await
        .unwrap();
    (result, resolver.calls())
}

fn summary(source: SourceKind, _context: &MatchContext) -> String {
    format!("{} from test", source.as_str())
}

macro_rules! reason_test {
    ($name:ident, $config:expr, $resolver:expr, $content:expr, $reason:expr) => {
        #[tokio::test]
        async fn $name() {
            let (result, _) = evaluate($config, $resolver, $content).await;
            assert_eq!(
                result.map(|r| r.reason),
                $reason,
                "content: {}",
                $content,
            );
        }
    };
}

// ── Scenarios ──

#[tokio::test]
async fn scenario_a_included_signature() {
    let config = TriggerConfig {
        include_signatures: list(&["ABC123"]),
        ..TriggerConfig::default()
    };
    let (result, calls) = evaluate(config, RecordingResolver::default(), "please run ABC123").await;
    let result = result.unwrap();
    assert_eq!(result.signature, "ABC123");
    assert_eq!(result.source, SourceKind::Message);
    assert!(result.build_override.is_none());
    assert!(calls.is_empty());
    assert_eq!(
        render(&result, &MatchContext::default(), &summary),
        "Matched build override `ABC123` in message from test"
    );
}

#[tokio::test]
async fn scenario_b_unlisted_signature_skips_resolver() {
    let config = TriggerConfig {
        exclude_signatures: list(&["ABC123"]),
        ..TriggerConfig::default()
    };
    let (result, calls) = evaluate(config, RecordingResolver::default(), "try XYZ999").await;
    let result = result.unwrap();
    assert_eq!(result.signature, "XYZ999");
    assert_eq!(result.reason, MatchReason::UnlistedSignature);
    assert!(calls.is_empty());
}

#[tokio::test]
async fn scenario_c_unresolved_signature() {
    let (result, calls) = evaluate(
        TriggerConfig::default(),
        RecordingResolver::default(),
        "ZZZ000",
    )
    .await;
    let result = result.unwrap();
    assert_eq!(result.signature, "ZZZ000");
    assert_eq!(result.reason, MatchReason::Unresolved);
    assert!(result.build_override.is_none());
    assert_eq!(calls, vec!["ZZZ000"]);
}

#[tokio::test]
async fn scenario_d_included_branch() {
    let config = TriggerConfig {
        include_branches: list(&["release"]),
        ..TriggerConfig::default()
    };
    let resolver =
        RecordingResolver::default().with("SIG1", &[("projA", OverrideTarget::branch("release"))]);
    let (result, _) = evaluate(config, resolver, "use SIG1 please").await;
    let result = result.unwrap();
    assert_eq!(result.reason, MatchReason::IncludedBranch);
    let build_override = result.build_override.as_ref().unwrap();
    assert_eq!(
        build_override.target_build_override.get("projA"),
        Some(&OverrideTarget::branch("release"))
    );
    assert_eq!(
        render(&result, &MatchContext::default(), &summary),
        "Matched build override for projects `projA` (branch release) in message from test"
    );
}

#[tokio::test]
async fn scenario_e_absent_message() {
    let resolver = Arc::new(RecordingResolver::default());
    let pulled = Arc::new(AtomicUsize::new(0));
    let trigger = trigger(TriggerConfig::default(), &resolver).with_sources(ScriptedSources {
        items: vec![(SourceKind::Message, "SIG1".into())],
        pulled: Arc::clone(&pulled),
    });
    assert_eq!(trigger.evaluate(None).await.unwrap(), None);
    assert!(resolver.calls().is_empty());
    assert_eq!(pulled.load(Ordering::SeqCst), 0);
}

// ── Signature policy precedence ──

reason_test!(
    include_wins_over_exclude_membership,
    TriggerConfig {
        include_signatures: list(&["ABC123"]),
        exclude_signatures: list(&["ABC123"]),
        ..TriggerConfig::default()
    },
    RecordingResolver::default(),
    "ABC123",
    Some(MatchReason::IncludedSignature)
);

reason_test!(
    include_wins_over_resolution,
    TriggerConfig {
        include_signatures: list(&["SIG1"]),
        exclude_branches: list(&["main"]),
        ..TriggerConfig::default()
    },
    RecordingResolver::default().with("SIG1", &[("web", OverrideTarget::branch("main"))]),
    "SIG1",
    Some(MatchReason::IncludedSignature)
);

reason_test!(
    exclude_absence_matches_despite_include_list,
    TriggerConfig {
        include_signatures: list(&["ABC123"]),
        exclude_signatures: list(&["DEF456"]),
        ..TriggerConfig::default()
    },
    RecordingResolver::default(),
    "XYZ999",
    Some(MatchReason::UnlistedSignature)
);

reason_test!(
    empty_exclude_list_flags_everything,
    TriggerConfig {
        exclude_signatures: list(&[]),
        ..TriggerConfig::default()
    },
    RecordingResolver::default(),
    "SIG1",
    Some(MatchReason::UnlistedSignature)
);

reason_test!(
    excluded_signature_defers_to_resolution,
    TriggerConfig {
        exclude_signatures: list(&["SIG1"]),
        ..TriggerConfig::default()
    },
    RecordingResolver::default().with("SIG1", &[("web", OverrideTarget::branch("main"))]),
    "SIG1",
    None
);

// ── Branch policy ──

reason_test!(
    unlisted_branch_matches,
    TriggerConfig {
        exclude_branches: list(&["main", "stable"]),
        ..TriggerConfig::default()
    },
    RecordingResolver::default().with("SIG1", &[("web", OverrideTarget::branch("feature"))]),
    "SIG1",
    Some(MatchReason::UnlistedBranch)
);

reason_test!(
    excluded_branch_does_not_match,
    TriggerConfig {
        exclude_branches: list(&["main", "stable"]),
        ..TriggerConfig::default()
    },
    RecordingResolver::default().with("SIG1", &[("web", OverrideTarget::branch("stable"))]),
    "SIG1",
    None
);

reason_test!(
    non_branch_target_never_decides,
    TriggerConfig {
        include_branches: list(&["991"]),
        exclude_branches: list(&[]),
        ..TriggerConfig::default()
    },
    RecordingResolver::default().with("SIG1", &[("ios", OverrideTarget::other("id", "991"))]),
    "SIG1",
    None
);

reason_test!(
    no_branch_lists_no_decision,
    TriggerConfig::default(),
    RecordingResolver::default().with("SIG1", &[("web", OverrideTarget::branch("feature"))]),
    "SIG1",
    None
);

#[tokio::test]
async fn first_decisive_project_is_reported_with_whole_override() {
    let config = TriggerConfig {
        include_branches: list(&["release"]),
        ..TriggerConfig::default()
    };
    let resolver = RecordingResolver::default().with(
        "SIG1",
        &[
            ("web", OverrideTarget::branch("release")),
            ("android", OverrideTarget::branch("main")),
            ("ios", OverrideTarget::other("id", "42")),
        ],
    );
    let (result, _) = evaluate(config, resolver, "SIG1").await;
    let result = result.unwrap();
    assert_eq!(result.reason, MatchReason::IncludedBranch);
    assert_eq!(
        render(&result, &MatchContext::default(), &summary),
        "Matched build override for projects `web, android, ios` \
         (branch release, branch main, id 42) in message from test"
    );
}

// ── Ordering and short-circuit ──

#[tokio::test]
async fn signature_policy_runs_over_all_signatures_before_resolution() {
    let config = TriggerConfig {
        include_signatures: list(&["SIG2"]),
        ..TriggerConfig::default()
    };
    let (result, calls) = evaluate(config, RecordingResolver::default(), "SIG1 then SIG2").await;
    assert_eq!(result.unwrap().signature, "SIG2");
    assert!(calls.is_empty());
}

#[tokio::test]
async fn resolution_stops_at_first_decisive_signature() {
    let resolver = RecordingResolver::default()
        .with("SIG1", &[("web", OverrideTarget::branch("main"))])
        .with("SIG3", &[("web", OverrideTarget::branch("main"))]);
    let (result, calls) = evaluate(
        TriggerConfig::default(),
        resolver,
        "SIG1 SIG2 SIG3 SIG1",
    )
    .await;
    let result = result.unwrap();
    assert_eq!(result.signature, "SIG2");
    assert_eq!(result.reason, MatchReason::Unresolved);
    assert_eq!(calls, vec!["SIG1", "SIG2"]);
}

#[tokio::test]
async fn duplicates_resolved_once() {
    let resolver =
        RecordingResolver::default().with("SIG1", &[("web", OverrideTarget::branch("main"))]);
    let (result, calls) = evaluate(TriggerConfig::default(), resolver, "SIG1 SIG1 SIG1").await;
    assert_eq!(result, None);
    assert_eq!(calls, vec!["SIG1"]);
}

#[tokio::test]
async fn later_sources_not_pulled_after_match() {
    let resolver = Arc::new(RecordingResolver::default());
    let pulled = Arc::new(AtomicUsize::new(0));
    let config = TriggerConfig {
        include_signatures: list(&["SIG2"]),
        ..TriggerConfig::default()
    };
    let trigger = trigger(config, &resolver).with_sources(ScriptedSources {
        items: vec![
            (SourceKind::Message, "no signatures here".into()),
            (SourceKind::Embed, "SIG2".into()),
            (SourceKind::Nickname, "SIG3".into()),
            (SourceKind::CustomStatus, "SIG4".into()),
        ],
        pulled: Arc::clone(&pulled),
    });

    let msg = message("");
    let result = trigger.evaluate(Some(&msg)).await.unwrap().unwrap();
    assert_eq!(result.source, SourceKind::Embed);
    assert_eq!(result.signature, "SIG2");
    assert_eq!(pulled.load(Ordering::SeqCst), 2);
    assert!(resolver.calls().is_empty());
}

#[tokio::test]
async fn undecided_source_moves_to_next() {
    let resolver = Arc::new(
        RecordingResolver::default().with("SIG1", &[("web", OverrideTarget::branch("main"))]),
    );
    let trigger = trigger(TriggerConfig::default(), &resolver).with_sources(ScriptedSources {
        items: vec![
            (SourceKind::Message, "SIG1".into()),
            (SourceKind::Username, "SIG9".into()),
        ],
        pulled: Arc::new(AtomicUsize::new(0)),
    });

    let msg = message("");
    let result = trigger.evaluate(Some(&msg)).await.unwrap().unwrap();
    assert_eq!(result.source, SourceKind::Username);
    assert_eq!(result.signature, "SIG9");
    assert_eq!(resolver.calls(), vec!["SIG1", "SIG9"]);
}

#[tokio::test]
async fn idempotent_with_consistent_resolver() {
    let resolver = Arc::new(
        RecordingResolver::default()
            .with("SIG1", &[("web", OverrideTarget::branch("feature"))]),
    );
    let config = TriggerConfig {
        exclude_branches: list(&["main"]),
        ..TriggerConfig::default()
    };
    let trigger = trigger(config, &resolver);
    let msg = message("SIG1 and SIG2");
    let first = trigger.evaluate(Some(&msg)).await.unwrap();
    let second = trigger.evaluate(Some(&msg)).await.unwrap();
    assert!(first.is_some());
    assert_eq!(first, second);
}

// ── Errors ──

#[tokio::test]
async fn resolver_failure_propagates() {
    let resolver = Arc::new(RecordingResolver::default().failing_on("SIG1"));
    let trigger = trigger(TriggerConfig::default(), &resolver);
    let msg = message("SIG1 SIG2");
    let err = trigger.evaluate(Some(&msg)).await.unwrap_err();
    assert!(matches!(err, ResolveError::Unavailable(_)));
    assert_eq!(resolver.calls(), vec!["SIG1"]);
}

#[tokio::test]
async fn resolver_failure_after_decision_is_never_reached() {
    let resolver = Arc::new(RecordingResolver::default().failing_on("SIG2"));
    let trigger = trigger(TriggerConfig::default(), &resolver);
    let msg = message("SIG1 SIG2");
    let result = trigger.evaluate(Some(&msg)).await.unwrap().unwrap();
    assert_eq!(result.signature, "SIG1");
    assert_eq!(result.reason, MatchReason::Unresolved);
}

// ── Text sources through the default enumerator ──

#[tokio::test]
async fn nickname_source_with_member_lookup() {
    let resolver = Arc::new(RecordingResolver::default());
    let config = TriggerConfig {
        match_messages: false,
        match_nicknames: true,
        include_signatures: list(&["NICK42"]),
        ..TriggerConfig::default()
    };
    let member = Member {
        user_id: "300".into(),
        nickname: Some("builds NICK42".into()),
        custom_status: None,
    };
    let trigger = trigger(config, &resolver).with_sources(MessageTextSources::with_lookup(
        override_trigger::sources::KnownMember(Some(member)),
    ));

    let msg = message("ABC123 in the body is ignored");
    let result = trigger.evaluate(Some(&msg)).await.unwrap().unwrap();
    assert_eq!(result.source, SourceKind::Nickname);
    assert_eq!(result.signature, "NICK42");
}

#[tokio::test]
async fn default_flags_ignore_usernames() {
    let resolver = Arc::new(RecordingResolver::default());
    let trigger = trigger(TriggerConfig::default(), &resolver);
    let mut msg = message("hello");
    msg.author.username = "SIG1".into();
    assert_eq!(trigger.evaluate(Some(&msg)).await.unwrap(), None);
}

#[tokio::test]
async fn crate_level_evaluate_uses_link_extractor() {
    let config = TriggerConfig {
        include_signatures: list(&["abc.def"]),
        ..TriggerConfig::default()
    };
    let msg = message("go to https://canary.discord.com/__development/link?s=abc.def");
    let result = override_trigger::evaluate(&config, Some(&msg), RecordingResolver::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.signature, "abc.def");
    assert_eq!(result.reason, MatchReason::IncludedSignature);
}
