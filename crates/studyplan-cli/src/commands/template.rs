//! Default template commands for CLI.

use clap::Subcommand;
use studyplan_core::{Config, DefaultBlockProvider, LabelTable, StandardTemplate, WeeklyBlock};

#[derive(Subcommand)]
pub enum TemplateAction {
    /// Show the default weekly template used in template mode
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub fn run(action: TemplateAction) -> Result<(), Box<dyn std::error::Error>> {
    let provider = StandardTemplate;

    match action {
        TemplateAction::Show { json } => {
            let mut blocks = provider.blocks();
            blocks.sort();
            if json {
                let out = serde_json::json!({
                    "template_tag": provider.template_tag(),
                    "blocks": blocks,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
                return Ok(());
            }

            let labels = LabelTable::for_locale(Config::load_or_default().display.locale);
            println!("Template: {}", provider.template_tag());
            for (day, name) in WEEKDAYS.iter().enumerate() {
                let ranges: Vec<String> = blocks
                    .iter()
                    .filter(|b| usize::from(b.day_of_week) == day)
                    .filter_map(WeeklyBlock::range)
                    .map(|r| r.to_string())
                    .collect();
                if ranges.is_empty() {
                    println!("  {name}  -");
                } else {
                    println!(
                        "  {name}  {} ({})",
                        ranges.join(", "),
                        labels.slot_type(studyplan_core::SlotType::Study)
                    );
                }
            }
        }
    }
    Ok(())
}
