use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use crate::document::{Document, ResourceId};
use crate::error::FetchError;
use crate::resource::MembershipResolver;
use super::finding::{AuditFinding, AuditReport, FindingKind, SkippedGroup};

pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone)]
pub struct AuditOptions {
    /// Upper bound on membership resolutions in flight at once.
    pub concurrency: usize,
    /// Outstanding resolutions are abandoned once this elapses.
    pub deadline: Option<Duration>,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            deadline: None,
        }
    }
}

impl AuditOptions {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

#[derive(Debug, Clone)]
struct Target {
    id: ResourceId,
    name: String,
}

/// Finds groups with no members.
///
/// Every group is resolved independently; a failed resolution skips that
/// group and is recorded in [`AuditReport::skipped`]. Findings are only built
/// from completed resolutions, so an expired deadline never yields a partial finding.
pub async fn audit_empty_groups(
    groups: &[Document],
    resolver: Arc<dyn MembershipResolver>,
    options: AuditOptions,
) -> AuditReport {
    let concurrency = options.concurrency.max(1);
    info!("auditing {} groups for members (concurrency {})", groups.len(), concurrency);

    let mut findings = Vec::new();
    let mut skipped = Vec::new();
    let mut outstanding: BTreeMap<usize, Target> = BTreeMap::new();

    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut tasks: JoinSet<(usize, Result<u64, FetchError>)> = JoinSet::new();
    let mut task_groups: HashMap<Id, usize> = HashMap::new();

    for (index, group) in groups.iter().enumerate() {
        let name = group.name().unwrap_or_default();
        let Some(id) = group.id() else {
            warn!("group '{}' has no usable id, skipping", name);
            skipped.push(SkippedGroup {
                id: None,
                name,
                reason: "missing id".to_string(),
            });
            continue;
        };

        outstanding.insert(index, Target { id: id.clone(), name });

        let resolver = Arc::clone(&resolver);
        let semaphore = Arc::clone(&semaphore);
        let handle = tasks.spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => {
                    debug!("resolving membership for group {}", id);
                    resolver.resolve_membership(&id).await
                }
                Err(_) => Err(FetchError::Transport("audit worker pool closed".to_string())),
            };
            (index, result)
        });
        task_groups.insert(handle.id(), index);
    }

    let expires_at = options.deadline.map(|d| Instant::now() + d);
    let mut timed_out = false;

    loop {
        let next = match expires_at {
            Some(at) => match tokio::time::timeout_at(at, tasks.join_next()).await {
                Ok(next) => next,
                Err(_) => {
                    timed_out = true;
                    tasks.abort_all();
                    break;
                }
            },
            None => tasks.join_next().await,
        };

        let Some(joined) = next else { break };

        match joined {
            Ok((index, result)) => {
                let Some(target) = outstanding.remove(&index) else { continue };
                match result {
                    Ok(0) => {
                        debug!("group {} is empty", target.id);
                        findings.push(AuditFinding {
                            id: target.id,
                            name: target.name,
                            kind: FindingKind::Empty,
                            evidence: Some(Document::mapping([("member_count", Document::from(0u64))])),
                        });
                    }
                    Ok(count) => debug!("group {} has {} members", target.id, count),
                    Err(e) => {
                        warn!("skipping group {} ({}): {}", target.id, target.name, e);
                        skipped.push(SkippedGroup {
                            id: Some(target.id),
                            name: target.name,
                            reason: e.to_string(),
                        });
                    }
                }
            }
            Err(e) => {
                let target = task_groups
                    .get(&e.id())
                    .and_then(|index| outstanding.remove(index));
                match target {
                    Some(target) => {
                        warn!("membership task for group {} failed: {}", target.id, e);
                        skipped.push(SkippedGroup {
                            id: Some(target.id),
                            name: target.name,
                            reason: format!("membership task failed: {}", e),
                        });
                    }
                    None => warn!("membership task failed: {}", e),
                }
            }
        }
    }

    let reason = if timed_out {
        warn!("audit timed out with {} groups unresolved", outstanding.len());
        "timed out before membership was resolved"
    } else {
        "membership task failed"
    };
    for target in outstanding.into_values() {
        skipped.push(SkippedGroup {
            id: Some(target.id),
            name: target.name,
            reason: reason.to_string(),
        });
    }

    findings.sort_by(|a, b| a.id.cmp(&b.id));
    skipped.sort_by(|a, b| (a.id.is_none(), &a.id).cmp(&(b.id.is_none(), &b.id)));

    info!(
        "audit finished: {} empty, {} skipped of {} groups",
        findings.len(),
        skipped.len(),
        groups.len()
    );

    AuditReport {
        scanned: groups.len(),
        findings,
        skipped,
    }
}
