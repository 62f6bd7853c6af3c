use crate::{ProfitPoint, SimulationError, SimulationSummary};
use serde::Serialize;
use std::io::Write;

const WIDTH: usize = 80;

fn format_summary(summary: &SimulationSummary, title: &str) -> String {
    let header = format!("{:-^WIDTH$}\n", format!(" {} ", title));
    format!("{}{}{}\n", header, summary, "-".repeat(WIDTH))
}

/// A public function to take a `SimulationSummary` and write it to a writer as an aligned table.
pub fn write_summary(
    summary: &SimulationSummary,
    title: &str,
    mut writer: impl Write,
) -> Result<(), SimulationError> {
    writer.write_all(format_summary(summary, title).as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Writes the summary as pretty printed JSON.
pub fn write_summary_json(
    summary: &SimulationSummary,
    mut writer: impl Write,
) -> Result<(), SimulationError> {
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writeln!(writer)?;
    Ok(())
}

/// Writes the profit series one point per line.
pub fn write_outputs(outputs: &[ProfitPoint], mut writer: impl Write) -> Result<(), SimulationError> {
    for point in outputs {
        writeln!(writer, "{}", point)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the profit series as a JSON array of `{ "played_hands", "profit" }` objects.
pub fn write_outputs_json(
    outputs: &[ProfitPoint],
    mut writer: impl Write,
) -> Result<(), SimulationError> {
    serde_json::to_writer(&mut writer, outputs)?;
    writeln!(writer)?;
    Ok(())
}

/// The summary and profit series of one simulation, serialized together as a single document.
#[derive(Serialize)]
pub struct SimulationReport<'a> {
    pub summary: &'a SimulationSummary,
    pub outputs: &'a [ProfitPoint],
}

/// Writes `{ "summary": .., "outputs": [..] }` as one pretty printed JSON object.
pub fn write_report_json(
    summary: &SimulationSummary,
    outputs: &[ProfitPoint],
    mut writer: impl Write,
) -> Result<(), SimulationError> {
    serde_json::to_writer_pretty(&mut writer, &SimulationReport { summary, outputs })?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> SimulationSummary {
        SimulationSummary {
            wins: 2,
            pushes: 0,
            losses: 1,
            player_blackjacks: 0,
            rounds_played: 3,
            starting_bankroll: 600.0,
            final_bankroll: 601.0,
            profit: 1.0,
            ended_early: false,
        }
    }

    #[test]
    fn summary_table_is_framed() {
        let mut buffer = Vec::new();
        write_summary(&summary(), "simulation", &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines = text.lines().collect::<Vec<&str>>();
        assert_eq!(lines.first().map(|l| l.len()), Some(WIDTH));
        assert!(lines[0].contains(" simulation "));
        assert_eq!(lines.last(), Some(&"-".repeat(WIDTH).as_str()));
    }

    #[test]
    fn summary_json_has_every_field() {
        let mut buffer = Vec::new();
        write_summary_json(&summary(), &mut buffer).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["wins"], 2);
        assert_eq!(value["rounds_played"], 3);
        assert_eq!(value["profit"], 1.0);
        assert_eq!(value["ended_early"], false);
    }

    #[test]
    fn outputs_as_json() {
        let outputs = [
            ProfitPoint {
                played_hands: 10,
                profit: -5.0,
            },
            ProfitPoint {
                played_hands: 20,
                profit: 12.5,
            },
        ];
        let mut buffer = Vec::new();
        write_outputs_json(&outputs, &mut buffer).unwrap();
        let parsed: Vec<ProfitPoint> = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed, outputs);

        let mut buffer = Vec::new();
        write_outputs(&outputs, &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap().lines().count(), 2);
    }

    #[test]
    fn report_is_a_single_document() {
        let outputs = [ProfitPoint {
            played_hands: 3,
            profit: 1.0,
        }];
        let mut buffer = Vec::new();
        write_report_json(&summary(), &outputs, &mut buffer).unwrap();

        let mut stream =
            serde_json::Deserializer::from_slice(&buffer).into_iter::<serde_json::Value>();
        let value = stream.next().unwrap().unwrap();
        assert!(stream.next().is_none());
        assert_eq!(value["summary"]["rounds_played"], 3);
        assert_eq!(value["outputs"][0]["played_hands"], 3);
        assert_eq!(value["outputs"].as_array().map(|a| a.len()), Some(1));
    }
}
