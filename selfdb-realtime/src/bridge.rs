//! Notification Bridge (§4.4): one long-lived `LISTEN` connection per
//! managed table, reconnecting with capped exponential backoff and
//! forwarding parsed `Change Event`s to the Subscription Router via a
//! broadcast channel.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio_postgres::{AsyncMessage, NoTls};

use selfdb_db::trigger::MANAGED_TABLES;

use crate::event::ChangeEvent;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Runs the bridge until the process shuts down. Spawns one task per
/// managed table's channel; a single channel's connection loss never
/// affects the others (§4.4 failure semantics).
pub fn spawn(database_url: String, sender: broadcast::Sender<ChangeEvent>) {
    for table in MANAGED_TABLES {
        let channel = format!("{table}_changes");
        let database_url = database_url.clone();
        let sender = sender.clone();
        tokio::spawn(listen_forever(database_url, channel, sender));
    }
}

async fn listen_forever(database_url: String, channel: String, sender: broadcast::Sender<ChangeEvent>) {
    let mut backoff = INITIAL_BACKOFF;
    loop {
        match listen_once(&database_url, &channel, &sender).await {
            Ok(()) => {
                // Connection closed cleanly (e.g. server shutdown); still retry.
                warn!("LISTEN connection closed, reconnecting"; "channel" => &channel);
            }
            Err(e) => {
                error!("LISTEN connection failed"; "channel" => &channel, "error" => %e);
            }
        }
        let jitter = Duration::from_millis(rand::random::<u64>() % 250);
        tokio::time::sleep(backoff + jitter).await;
        backoff = std::cmp::min(backoff * 2, MAX_BACKOFF);
    }
}

async fn listen_once(
    database_url: &str,
    channel: &str,
    sender: &broadcast::Sender<ChangeEvent>,
) -> Result<(), tokio_postgres::Error> {
    let (client, mut connection) = tokio_postgres::connect(database_url, NoTls).await?;

    client
        .batch_execute(&format!("LISTEN \"{channel}\""))
        .await?;
    info!("subscribed to channel"; "channel" => channel);

    // Reset backoff on first successful subscribe by returning control to
    // the caller only once the connection stream itself ends.
    use futures::stream::poll_fn;
    use futures::StreamExt;

    let mut stream = poll_fn(move |cx| connection.poll_message(cx));
    while let Some(message) = stream.next().await {
        match message {
            Ok(AsyncMessage::Notification(notification)) => {
                match ChangeEvent::from_notify_payload(channel, notification.payload()) {
                    Ok(event) => {
                        // No subscribers is not an error; it just means
                        // nobody's listening on the router side right now.
                        let _ = sender.send(event);
                    }
                    Err(e) => {
                        error!("failed to parse change event payload"; "channel" => channel, "error" => %e);
                    }
                }
            }
            Ok(AsyncMessage::Notice(notice)) => {
                debug!("postgres notice on listen connection"; "channel" => channel, "notice" => %notice);
            }
            Ok(_) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
