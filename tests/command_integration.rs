//! Integration tests for the clearlag command surface
//!
//! These tests drive PopulationControl through parsed console lines, the
//! way the binary does:
//! - manual cleanup with permission and usage checks
//! - reload from a config file on disk
//! - status reporting

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clearlag::command::{parse_command, ClearlagCommand, CommandExecutor, CommandSender};
use clearlag::control::PopulationControl;
use clearlag::core::config::FileConfig;
use clearlag::core::types::seconds_to_ticks;
use clearlag::ecs::world::Server;
use clearlag::entity::category::EntityCategory;
use clearlag::notify::messages::strip_colour_codes;
use clearlag::notify::{Audience, MessageRouter, Notifier, Outcome, COMMAND_PERMISSION};
use clearlag::simulation::domain::MutationDomain;

/// Broadcast messages, colour codes stripped
#[derive(Clone, Default)]
struct Inbox {
    lines: Arc<Mutex<Vec<(String, Audience)>>>,
}

impl Notifier for Inbox {
    fn deliver(&self, message: &str, audience: &Audience) {
        self.lines
            .lock()
            .unwrap()
            .push((strip_colour_codes(message), audience.clone()));
    }
}

struct TempConfig(PathBuf);

impl TempConfig {
    fn new(name: &str, content: &str) -> Self {
        let path = std::env::temp_dir().join(format!("clearlag-{}-{}.toml", name, std::process::id()));
        std::fs::write(&path, content).unwrap();
        Self(path)
    }

    fn rewrite(&self, content: &str) {
        std::fs::write(&self.0, content).unwrap();
    }
}

impl Drop for TempConfig {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

const INITIAL: &str = r#"
cleanup-interval-seconds = 300
cleanup-delay-seconds = 60
entities-to-clear = ["ARROW"]

[messages]
command-success = "&aCleared %count% by hand."
"#;

fn setup(config: &TempConfig, server: Server) -> (MutationDomain, PopulationControl, Inbox) {
    let domain = MutationDomain::spawn(server);
    let inbox = Inbox::default();
    let router = MessageRouter::new(Default::default(), inbox.clone());
    let control = PopulationControl::new(
        domain.handle(),
        Arc::new(FileConfig::new(&config.0)),
        Arc::new(router),
    );
    (domain, control, inbox)
}

async fn run_line(control: &PopulationControl, sender: &CommandSender, line: &str) -> Vec<String> {
    let command = parse_command(line).unwrap();
    CommandExecutor::execute(control, sender, &command)
        .await
        .replies
        .iter()
        .map(|r| strip_colour_codes(r))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_manual_cleanup_uses_configured_template() {
    let config = TempConfig::new("manual", INITIAL);
    let mut server = Server::with_worlds(["overworld"]);
    server.spawn(0, EntityCategory::Arrow);
    server.spawn(0, EntityCategory::Arrow);
    server.spawn(0, EntityCategory::DroppedItem);
    let (domain, control, inbox) = setup(&config, server);

    let replies = run_line(&control, &CommandSender::console(), "clearlag").await;
    assert_eq!(replies, vec!["Cleared 2 by hand."]);
    // Manual results are not broadcast
    assert!(inbox.lines.lock().unwrap().is_empty());

    let server = domain.shutdown().await.unwrap();
    assert_eq!(server.count_of(EntityCategory::DroppedItem), 1);
}

#[tokio::test(start_paused = true)]
async fn test_permission_and_usage() {
    let config = TempConfig::new("perm", INITIAL);
    let (_domain, control, _inbox) = setup(&config, Server::with_worlds(["overworld"]));

    let guest = CommandSender::new("guest", ["clearlag.message"]);
    let replies = run_line(&control, &guest, "clearlag").await;
    assert_eq!(replies, vec!["You do not have permission to use this command."]);

    let admin = CommandSender::new("admin", [COMMAND_PERMISSION]);
    let replies = run_line(&control, &admin, "clearlag everything now").await;
    assert_eq!(replies, vec!["Usage: /clearlag [reload|status]"]);
}

#[tokio::test(start_paused = true)]
async fn test_reload_swaps_settings_and_restarts_schedules() {
    let config = TempConfig::new("reload", INITIAL);
    let (_domain, control, inbox) = setup(&config, Server::with_worlds(["overworld"]));
    control.start();
    let before = control.coordinator().reduction_handle().unwrap();

    config.rewrite(
        r#"
cleanup-interval-seconds = 30
cleanup-delay-seconds = 5
entities-to-clear = ["EGG", "SNOWBALL"]

[messages]
reload-success = "reloaded!"
post-cleanup = "swept %count%"
"#,
    );
    let replies = run_line(&control, &CommandSender::console(), "clearlag reload").await;
    assert_eq!(replies, vec!["reloaded!"]);

    let settings = control.settings();
    assert_eq!(settings.reduction_interval_ticks, seconds_to_ticks(30));
    assert!(settings.filter.contains(EntityCategory::Egg));
    assert!(!settings.filter.contains(EntityCategory::Arrow));
    assert!(before.is_cancelled());

    // New delay and new templates apply to the next scheduled pass
    tokio::time::sleep(std::time::Duration::from_secs(6)).await;
    let lines = inbox.lines.lock().unwrap().clone();
    assert!(lines.iter().any(|(text, audience)| text == "swept 0"
        && *audience == Audience::Permission("clearlag.message".to_string())));
}

#[tokio::test(start_paused = true)]
async fn test_reload_while_stopped_keeps_schedules_unarmed() {
    let config = TempConfig::new("stopped", INITIAL);
    let (_domain, control, _inbox) = setup(&config, Server::with_worlds(["overworld"]));

    control.reload();
    assert!(!control.is_running());
    assert!(control.coordinator().reduction_handle().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_status_reports_population() {
    let config = TempConfig::new("status", INITIAL);
    let mut server = Server::with_worlds(["overworld", "nether"]);
    server.spawn(0, EntityCategory::Arrow);
    server.spawn(1, EntityCategory::Arrow);
    server.spawn(1, EntityCategory::Pig);
    let (_domain, control, _inbox) = setup(&config, server);
    control.start();

    assert_eq!(parse_command("clearlag status"), Some(ClearlagCommand::Status));
    let replies = run_line(&control, &CommandSender::console(), "clearlag status").await;
    assert!(replies[0].starts_with("running | 2 of 3 entities"), "{}", replies[0]);

    let report = control.status().await.unwrap();
    assert_eq!(report.categories, vec!["ARROW".to_string()]);
    assert_eq!(report.population_ceiling, 1000);

    control.stop();
    let outcome = control.manual_cleanup().await;
    assert_eq!(outcome, Outcome::CleanupDone { removed: 2, manual: true });
    assert_eq!(control.status().await.unwrap().manual_passes, 1);
}
