use std::future::Future;
use std::time::Duration;

use surrealdb::Response;
use uuid::Uuid;

use crate::middleware::error::{AppError, AppResult};

pub const THROW_TASK_UNAVAILABLE: &str = "Task unavailable";
pub const THROW_TASK_COMPLETED: &str = "Task already completed";
pub const THROW_ACCOUNT_NOT_FOUND: &str = "Balance account not found";
pub const THROW_ATTEMPT_NOT_PENDING: &str = "Payout attempt not pending";
/// Carries the retryable marker: the consensus pass re-reads its submissions.
pub const THROW_SUBMISSIONS_CHANGED: &str = "Task submissions changed, consensus can be retried";

const RECORD_EXISTS: &str = "already exists";
const RETRYABLE: &str = "can be retried";
const MAX_CONFLICT_RETRIES: u32 = 25;

/// Maps `THROW` messages and store errors of a multi-statement query to typed errors.
/// Statements cancelled by a failed transaction are reported through the statement
/// that caused the failure.
pub fn check_transaction_custom_error(query_response: &mut Response) -> AppResult<()> {
    let mut errors: Vec<(usize, surrealdb::Error)> =
        query_response.take_errors().into_iter().collect();
    errors.sort_by_key(|(index, _)| *index);

    let query_err = errors.iter().fold(None, |ret, (_, error)| {
        if matches!(ret, Some(ref e) if !matches!(e, AppError::SurrealDb { .. })) {
            return ret;
        }
        let message = error.to_string();
        let custom = map_store_error(&message);
        match (ret, custom) {
            (_, Some(custom)) => Some(custom),
            (None, None) => Some(AppError::SurrealDb { source: message }),
            // a conflict reported after a generic failure must stay retryable
            (Some(AppError::SurrealDb { source }), None)
                if !source.contains(RETRYABLE) && message.contains(RETRYABLE) =>
            {
                Some(AppError::SurrealDb { source: message })
            }
            (ret, None) => ret,
        }
    });

    match query_err {
        None => Ok(()),
        Some(err) => Err(err),
    }
}

fn map_store_error(message: &str) -> Option<AppError> {
    if message.contains(THROW_TASK_UNAVAILABLE) {
        Some(AppError::Unavailable {
            description: THROW_TASK_UNAVAILABLE.to_string(),
        })
    } else if message.contains(THROW_TASK_COMPLETED) {
        Some(AppError::Conflict {
            description: THROW_TASK_COMPLETED.to_string(),
        })
    } else if message.contains(THROW_ACCOUNT_NOT_FOUND) {
        Some(AppError::EntityFailIdNotFound {
            ident: THROW_ACCOUNT_NOT_FOUND.to_string(),
        })
    } else if message.contains(THROW_ATTEMPT_NOT_PENDING) {
        Some(AppError::Conflict {
            description: THROW_ATTEMPT_NOT_PENDING.to_string(),
        })
    } else if message.contains(RECORD_EXISTS) {
        Some(AppError::Conflict {
            description: "Record already exists".to_string(),
        })
    } else {
        None
    }
}

pub fn is_retryable_conflict(err: &AppError) -> bool {
    matches!(err, AppError::SurrealDb { source } if source.contains(RETRYABLE))
}

/// Re-runs `op` while the store reports an optimistic write conflict.
pub async fn with_conflict_retry<T, F, Fut>(mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Err(err) if is_retryable_conflict(&err) && attempt < MAX_CONFLICT_RETRIES => {
                attempt += 1;
                let jitter = (Uuid::new_v4().as_u128() % 7) as u64;
                let backoff = 2u64.pow(attempt.min(6)) + jitter;
                tracing::debug!("write conflict, retry {attempt} in {backoff}ms");
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }
            res => return res,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn maps_thrown_messages() {
        assert!(matches!(
            map_store_error("An error occurred: Task unavailable"),
            Some(AppError::Unavailable { .. })
        ));
        assert!(matches!(
            map_store_error("Database record `review_submission:a_b` already exists"),
            Some(AppError::Conflict { .. })
        ));
        assert!(map_store_error("Some other failure").is_none());
    }

    #[tokio::test]
    async fn retries_only_conflicts() {
        let calls = AtomicU32::new(0);
        let res = with_conflict_retry(|| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(AppError::SurrealDb {
                        source: "Transaction conflict. This transaction can be retried".into(),
                    })
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(res, Ok(2));

        let calls = AtomicU32::new(0);
        let res: AppResult<()> = with_conflict_retry(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(AppError::Conflict {
                    description: "dup".into(),
                })
            }
        })
        .await;
        assert!(res.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
