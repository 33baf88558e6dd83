//! Activity polling.
//!
//! Blocks the invoking command until submitted activities reach a
//! terminal state. Commands with a `--no-wait` flag skip this entirely;
//! success is then defined as "submission succeeded".

use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use cumulus_client::{Activity, ApiClient};
use tokio::time::Instant;
use tracing::debug;

use crate::output::{print_success, print_warning};

/// Polling cadence and overall timeout.
#[derive(Debug, Clone)]
pub struct WaitOptions {
    pub interval: Duration,
    pub timeout: Option<Duration>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: None,
        }
    }
}

/// Poll one activity until it reaches a terminal state, printing state
/// transitions. Returns the final activity.
pub async fn wait_for(
    client: &ApiClient,
    project: &str,
    mut activity: Activity,
    opts: &WaitOptions,
) -> Result<Activity> {
    let start = Instant::now();
    let mut last_state = activity.state;

    while !activity.is_terminal() {
        if let Some(timeout) = opts.timeout {
            if start.elapsed() >= timeout {
                anyhow::bail!(
                    "Timed out after {}s waiting for activity {}",
                    timeout.as_secs(),
                    activity.id
                );
            }
        }

        tokio::time::sleep(opts.interval).await;
        activity = client.activity(project, &activity.id).await?;

        if activity.state != last_state {
            debug!(activity = %activity.id, state = %activity.state, "activity state changed");
            println!(
                "  {}",
                format!("activity {} is {}", activity.id, activity.state).dimmed()
            );
            last_state = activity.state;
        }
    }

    Ok(activity)
}

/// Wait for one activity and report the result with the given messages.
/// Returns whether the activity completed successfully.
pub async fn wait_and_report(
    client: &ApiClient,
    project: &str,
    activity: Activity,
    success_msg: &str,
    failure_msg: &str,
    opts: &WaitOptions,
) -> Result<bool> {
    let final_activity = wait_for(client, project, activity, opts).await?;
    if final_activity.is_complete() {
        print_success(success_msg);
        Ok(true)
    } else {
        print_warning(failure_msg);
        Ok(false)
    }
}

/// Poll a whole set of activities until each is terminal. A failed or
/// unpollable activity does not stop the others. Returns per-activity
/// success flags aligned with the input order.
pub async fn wait_for_many(
    client: &ApiClient,
    project: &str,
    activities: &[Activity],
    opts: &WaitOptions,
) -> Vec<bool> {
    struct Slot {
        activity: Activity,
        done: bool,
        success: bool,
    }

    let mut slots: Vec<Slot> = activities
        .iter()
        .map(|activity| Slot {
            activity: activity.clone(),
            done: false,
            success: false,
        })
        .collect();

    let start = Instant::now();

    loop {
        for slot in slots.iter_mut().filter(|slot| !slot.done) {
            if !slot.activity.is_terminal() {
                match client.activity(project, &slot.activity.id).await {
                    Ok(refreshed) => slot.activity = refreshed,
                    Err(e) => {
                        print_warning(&format!(
                            "Lost track of activity {}: {e}",
                            slot.activity.id
                        ));
                        slot.done = true;
                        continue;
                    }
                }
            }

            if slot.activity.is_terminal() {
                slot.done = true;
                slot.success = slot.activity.is_complete();
                if slot.success {
                    print_success(&format!(
                        "Activity {} ({}) complete",
                        slot.activity.id, slot.activity.activity_type
                    ));
                } else {
                    print_warning(&format!(
                        "Activity {} ({}) failed",
                        slot.activity.id, slot.activity.activity_type
                    ));
                }
            }
        }

        if slots.iter().all(|slot| slot.done) {
            break;
        }

        if let Some(timeout) = opts.timeout {
            if start.elapsed() >= timeout {
                for slot in slots.iter_mut().filter(|slot| !slot.done) {
                    print_warning(&format!(
                        "Timed out waiting for activity {}",
                        slot.activity.id
                    ));
                    slot.done = true;
                }
                break;
            }
        }

        tokio::time::sleep(opts.interval).await;
    }

    slots.into_iter().map(|slot| slot.success).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn activity_json(id: &str, state: &str) -> serde_json::Value {
        json!({
            "id": id,
            "type": "environment.deactivate",
            "payload": {},
            "created_at": "2024-03-01T12:00:00Z",
            "state": state,
            "operations": []
        })
    }

    fn pending_activity(id: &str) -> Activity {
        serde_json::from_value(activity_json(id, "pending")).unwrap()
    }

    fn fast() -> WaitOptions {
        WaitOptions {
            interval: Duration::from_millis(5),
            timeout: Some(Duration::from_secs(5)),
        }
    }

    #[tokio::test]
    async fn waits_until_terminal_state() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/projects/p1/activities/act_1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(activity_json("act_1", "in-progress")),
            )
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/projects/p1/activities/act_1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(activity_json("act_1", "complete")),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), None).unwrap();
        let final_activity = wait_for(&client, "p1", pending_activity("act_1"), &fast())
            .await
            .unwrap();
        assert!(final_activity.is_complete());
    }

    #[tokio::test]
    async fn one_failed_activity_does_not_stop_the_others() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/projects/p1/activities/act_ok"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(activity_json("act_ok", "complete")),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/projects/p1/activities/act_bad"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(activity_json("act_bad", "failed")),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), None).unwrap();
        let results = wait_for_many(
            &client,
            "p1",
            &[pending_activity("act_bad"), pending_activity("act_ok")],
            &fast(),
        )
        .await;
        assert_eq!(results, vec![false, true]);
    }

    #[tokio::test]
    async fn unpollable_activity_counts_as_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/projects/p1/activities/act_gone"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": "not_found",
                "message": "No such activity"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/projects/p1/activities/act_ok"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(activity_json("act_ok", "complete")),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), None).unwrap();
        let results = wait_for_many(
            &client,
            "p1",
            &[pending_activity("act_gone"), pending_activity("act_ok")],
            &fast(),
        )
        .await;
        assert_eq!(results, vec![false, true]);
    }

    #[tokio::test]
    async fn already_terminal_activity_returns_without_polling() {
        let server = MockServer::start().await;
        // No mocks mounted: any request would fail the test.

        let client = ApiClient::new(&server.uri(), None).unwrap();
        let complete: Activity =
            serde_json::from_value(activity_json("act_done", "complete")).unwrap();
        let final_activity = wait_for(&client, "p1", complete, &fast()).await.unwrap();
        assert!(final_activity.is_complete());
    }
}
