//! `jm profile`: manage CSV export profiles.

use super::Session;
use crate::cli::{ProfileCommands, ProfileArgs};
use crate::config::{ExportProfile, MetricFlags, TransitionRule};
use crate::error::Result;
use crate::metrics::BusinessHours;
use crate::output::{DataTable, DetailPanel, OutputContext};
use serde::Serialize;
use tracing::info;

/// # Errors
///
/// Returns an error for invalid rules, unknown profiles, or I/O failures.
pub fn execute(command: &ProfileCommands, session: &Session) -> Result<()> {
    let store = session.paths.profiles();
    let out = &session.out;
    match command {
        ProfileCommands::List => list(&store.list()?, out),
        ProfileCommands::Show { name } => show(&store.load(name)?, out),
        ProfileCommands::Save { name, inline } => {
            let profile = profile_from_args(name, inline)?;
            let path = store.save(&profile)?;
            info!(profile = %name, path = %path.display(), "Saved export profile");
            if out.is_json() {
                out.json(&profile);
            } else {
                out.success(&format!("Saved profile '{name}' to {}", path.display()));
            }
        }
        ProfileCommands::Delete { name } => {
            store.delete(name)?;
            if out.is_json() {
                out.json(&serde_json::json!({ "deleted": name }));
            } else {
                out.success(&format!("Deleted profile '{name}'"));
            }
        }
    }
    Ok(())
}

/// Build a profile from command-line settings.
///
/// # Errors
///
/// Returns a validation error for a malformed `--rule`.
pub fn profile_from_args(name: &str, inline: &ProfileArgs) -> Result<ExportProfile> {
    let mut profile = ExportProfile {
        name: name.to_string(),
        ..ExportProfile::default()
    };
    apply_args(&mut profile, inline)?;
    Ok(profile)
}

/// Layer inline settings over `profile`: fields and rules are appended,
/// metric flags are switched on, business hours replace any saved ones.
///
/// # Errors
///
/// Returns a validation error for a malformed `--rule`.
pub fn apply_args(profile: &mut ExportProfile, inline: &ProfileArgs) -> Result<()> {
    for field in &inline.fields {
        let field = field.trim();
        if !field.is_empty() && !profile.selected_field_ids.iter().any(|f| f == field) {
            profile.selected_field_ids.push(field.to_string());
        }
    }
    for raw in &inline.rules {
        profile.transition_rules.push(TransitionRule::parse(raw)?);
    }

    let flags = &mut profile.metrics;
    *flags = MetricFlags {
        time_in_status: flags.time_in_status || inline.time_in_status,
        comment_count: flags.comment_count || inline.comment_count,
        comment_length: flags.comment_length || inline.comment_length,
        commenter_count: flags.commenter_count || inline.commenter_count,
    };

    if let (Some(start), Some(end)) = (&inline.business_start, &inline.business_end) {
        profile.business_hours = Some(BusinessHours {
            start: start.clone(),
            end: end.clone(),
            timezone: inline.timezone.clone(),
            exclude_weekends: !inline.include_weekends,
            holidays: inline.holidays.clone(),
        });
    }
    Ok(())
}

#[derive(Serialize)]
struct ProfileList<'a> {
    profiles: &'a [String],
}

fn list(names: &[String], out: &OutputContext) {
    if out.is_json() {
        out.json(&ProfileList { profiles: names });
        return;
    }
    if names.is_empty() {
        out.info("No export profiles saved");
        return;
    }
    let mut table = DataTable::new(["Profile"], out.theme()).key_column(0);
    for name in names {
        table.add_row(vec![name.clone()]);
    }
    out.table(&table);
}

fn show(profile: &ExportProfile, out: &OutputContext) {
    if out.is_json() {
        out.json(profile);
        return;
    }

    let mut panel = DetailPanel::new(format!("Profile {}", profile.name), out.theme());
    panel.add("Fields", join_or_dash(&profile.selected_field_ids));
    if !profile.selected_field_names.is_empty() {
        panel.add("Field names", profile.selected_field_names.join(", "));
    }
    for rule in &profile.transition_rules {
        panel.add(format!("Rule {}", rule.name), rule.sequence.join(" > "));
    }

    let metrics = &profile.metrics;
    let enabled: Vec<String> = [
        (metrics.time_in_status, "time_in_status"),
        (metrics.comment_count, "comment_count"),
        (metrics.comment_length, "comment_length"),
        (metrics.commenter_count, "commenter_count"),
    ]
    .into_iter()
    .filter(|(on, _)| *on)
    .map(|(_, name)| name.to_string())
    .collect();
    panel.add("Metrics", join_or_dash(&enabled));

    if let Some(bh) = &profile.business_hours {
        panel.add(
            "Business hours",
            format!(
                "{}-{} {}{}",
                bh.start,
                bh.end,
                bh.timezone,
                if bh.exclude_weekends { ", weekdays" } else { "" }
            ),
        );
        if !bh.holidays.is_empty() {
            panel.add("Holidays", bh.holidays.join(", "));
        }
    }
    out.details(&panel);
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}
