//! Delimited-text export of evaluated result rows.

use crate::db::models::ResultRow;

const NOT_FOUND: &str = "N/A";

/// Render result rows as CSV with the fixed column order
/// `Player,Metric,Target,Actual,Met`. Not-found actuals export as `N/A`.
pub fn results_to_csv(rows: &[ResultRow]) -> String {
    let mut out = String::from("Player,Metric,Target,Actual,Met\n");
    for row in rows {
        let actual = match row.actual {
            Some(v) => format_number(v),
            None => NOT_FOUND.to_string(),
        };
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            escape_field(&row.player),
            row.metric,
            format_number(row.target),
            actual,
            row.met,
        ));
    }
    out
}

/// Integral values print without a trailing `.0` so targets entered as whole
/// numbers round-trip cleanly.
fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

fn escape_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Metric;

    fn row(player: &str, metric: Metric, target: f64, actual: Option<f64>, met: bool) -> ResultRow {
        ResultRow {
            player: player.to_string(),
            metric,
            target,
            actual,
            met,
        }
    }

    #[test]
    fn test_csv_column_order_and_values() {
        let rows = vec![
            row("Aaron Judge", Metric::Hits, 1.0, Some(2.0), true),
            row("Nobody Real", Metric::Runs, 1.0, None, false),
        ];
        let csv = results_to_csv(&rows);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Player,Metric,Target,Actual,Met");
        assert_eq!(lines[1], "Aaron Judge,hits,1,2,true");
        assert_eq!(lines[2], "Nobody Real,runs,1,N/A,false");
    }

    #[test]
    fn test_fractional_targets_keep_fraction() {
        let rows = vec![row("Nikola Jokic", Metric::Points, 25.5, Some(27.0), true)];
        let csv = results_to_csv(&rows);
        assert!(csv.contains("Nikola Jokic,points,25.5,27,true"));
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let rows = vec![row("Judge, Aaron", Metric::Hits, 1.0, None, false)];
        let csv = results_to_csv(&rows);
        assert!(csv.contains("\"Judge, Aaron\",hits,1,N/A,false"));
    }
}
