use crate::commands::{markdown_table, Out};
use crate::ledger::{Series, SeriesKind, SummaryView};
use crate::session::Session;
use crate::{Config, Result};
use chrono::Month;

/// Handles the `fintrack summary` command: total spend, most frequent category, spend per
/// category with its share of the total, and the `kind` series.
pub async fn summary(config: &Config, kind: SeriesKind) -> Result<Out<SummaryView>> {
    let session = Session::resume(config).await?;
    let view = session.summarize(kind);
    let report = render(&view);
    let message = format!(
        "Summarized {} transactions for {}",
        view.count(),
        session.identity().email
    );
    Ok(Out::new(message, view).with_report(report))
}

fn render(view: &SummaryView) -> String {
    let mut sections = Vec::new();

    let mode = match view.most_frequent_category() {
        Ok(category) => category.to_string(),
        Err(_) => "none, there are no transactions yet".to_string(),
    };
    sections.push(format!(
        "Transactions: {}\nTotal spent: {}\nMost frequent category: {mode}",
        view.count(),
        view.total()
    ));

    if !view.per_category().is_empty() {
        let rows: Vec<Vec<String>> = view
            .per_category()
            .iter()
            .map(|c| {
                vec![
                    c.category.to_string(),
                    c.total.to_string(),
                    format!("{:.1}%", c.percent),
                    c.count.to_string(),
                ]
            })
            .collect();
        sections.push(format!(
            "Spending by category:\n{}",
            markdown_table(&["Category", "Total", "Share", "Count"], &rows)
        ));
    }

    let series = view.series();
    let title = match series {
        Series::Weekly { .. } => "Weekly spending (week starting Monday):".to_string(),
        Series::Daily { year, month, .. } => {
            let name = u8::try_from(*month)
                .ok()
                .and_then(|m| Month::try_from(m).ok())
                .map(|m| m.name().to_string())
                .unwrap_or_else(|| month.to_string());
            format!("Daily spending for {name} {year}:")
        }
    };
    if series.is_empty() {
        sections.push(format!("{title}\nNo spending to chart."));
    } else {
        let header = match series.kind() {
            SeriesKind::Weekly => "Week",
            SeriesKind::Daily => "Day",
        };
        let rows: Vec<Vec<String>> = series
            .points()
            .into_iter()
            .map(|(label, total)| vec![label, total.to_string()])
            .collect();
        sections.push(format!(
            "{title}\n{}",
            markdown_table(&[header, "Total"], &rows)
        ));
    }

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;
    use crate::model::{Candidate, Entry, Transaction, TxnId};
    use crate::test::TestEnv;
    use chrono::NaiveDate;

    fn ledger(rows: &[(&str, &str, &str)]) -> Ledger {
        let entries = rows
            .iter()
            .enumerate()
            .map(|(ix, (date, amount, category))| {
                let c = Candidate::new(*date, "", *amount, *category);
                Entry::new(
                    TxnId::new(ix.to_string()),
                    Transaction::try_from(c).unwrap(),
                )
            })
            .collect();
        Ledger::hydrate("ada@example.com", entries)
    }

    #[test]
    fn test_render_february() {
        let ledger = ledger(&[
            ("2024-02-10", "50", "Food"),
            ("2024-02-15", "30", "Food"),
            ("2024-02-20", "20", "Bills"),
        ]);
        let today = NaiveDate::from_ymd_opt(2024, 2, 25).unwrap();
        let out = render(&ledger.summarize_at(SeriesKind::Daily, today));

        assert!(out.contains("Total spent: $100.00"));
        assert!(out.contains("Most frequent category: Food"));
        assert!(out.contains("| Food     | $80.00 | 80.0% | 2     |"));
        assert!(out.contains("| Bills    | $20.00 | 20.0% | 1     |"));
        assert!(out.contains("Daily spending for February 2024:"));
        assert!(out.contains("| 29  | $0.00  |"));
        assert!(!out.contains("| 30 "));
    }

    #[test]
    fn test_render_weekly() {
        let ledger = ledger(&[("2024-03-03", "5", "Other"), ("2024-03-04", "7", "Other")]);
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let out = render(&ledger.summarize_at(SeriesKind::Weekly, today));
        assert!(out.contains("| 2024-02-26 | $5.00 |"));
        assert!(out.contains("| 2024-03-04 | $7.00 |"));
    }

    #[test]
    fn test_render_empty() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let out = render(&ledger(&[]).summarize_at(SeriesKind::Weekly, today));
        assert!(out.contains("Total spent: $0.00"));
        assert!(out.contains("Most frequent category: none"));
        assert!(!out.contains("Spending by category"));
        assert!(out.contains("No spending to chart."));
    }

    #[tokio::test]
    async fn test_summary() {
        let env = TestEnv::new().await;
        let mut session = env.login("ada@example.com").await;
        let today = chrono::Local::now().date_naive().to_string();
        session
            .append(Candidate::new(today, "Coffee", "4.50", "Food"))
            .await
            .unwrap();

        let out = summary(&env.config(), SeriesKind::Daily).await.unwrap();
        let view = out.structure().unwrap();
        assert_eq!(view.count(), 1);
        assert_eq!(view.series().total(), view.total());
        assert!(out.report().unwrap().contains("$4.50"));
    }
}
