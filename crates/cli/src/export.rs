use std::io;

use kassenwart_statement::Transaction;

const CSV_HEADER: [&str; 15] = [
    "t_id",
    "date",
    "amount",
    "type",
    "type_confidence",
    "member_id",
    "member_given_names",
    "member_family_name",
    "member_confidence",
    "event",
    "event_confidence",
    "account_holder",
    "posting",
    "reference",
    "problems",
];

/// Review sheet, semicolon-delimited like the bank export it came from.
/// Member and event columns carry the best candidate only; the full
/// candidate lists are a JSON concern.
pub fn write_csv<W: io::Write>(out: W, transactions: &[Transaction]) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(out);
    writer.write_record(CSV_HEADER)?;

    for tx in transactions {
        let (member_id, given_names, family_name, member_level) = match &tx.best_member {
            Some((member, level)) => (
                member.id.to_string(),
                member.given_names.clone(),
                member.family_name.clone(),
                level.to_string(),
            ),
            None => Default::default(),
        };
        let (event, event_level) = match &tx.best_event {
            Some((title, level)) => (title.clone(), level.to_string()),
            None => Default::default(),
        };
        let problems: Vec<String> = tx.problems.iter().map(ToString::to_string).collect();

        writer.write_record([
            tx.t_id.to_string(),
            tx.statement_date.to_string(),
            tx.amount_export(),
            tx.transaction_type.to_string(),
            tx.type_confidence.map(|c| c.to_string()).unwrap_or_default(),
            member_id,
            given_names,
            family_name,
            member_level,
            event,
            event_level,
            tx.account_holder.clone(),
            tx.posting.clone(),
            tx.reference.clone(),
            problems.join("; "),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Full records, candidate lists and all.
pub fn write_json<W: io::Write>(out: W, transactions: &[Transaction]) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(out, transactions)
}

/// Per-transaction dump for the terminal.
pub fn write_table<W: io::Write>(mut out: W, transactions: &[Transaction]) -> io::Result<()> {
    for tx in transactions {
        writeln!(out, "{tx}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kassenwart_statement::{classify_statement, EventDirectory, EventRecord, Roster};

    fn classified() -> Vec<Transaction> {
        let events = EventDirectory::new([EventRecord {
            title: "WinterAkademie 2024/25".to_string(),
            begin: NaiveDate::from_ymd_opt(2024, 12, 27),
            end: NaiveDate::from_ymd_opt(2025, 1, 6),
        }])
        .unwrap();
        let mut roster = Roster::new();
        roster.insert(123, "Max", "Mustermann");

        let mut fields = vec![""; 21];
        fields[0] = "8068901";
        fields[2] = "01.03.24";
        fields[7] = "150,00";
        fields[12] = "Überweisung";
        let mut row = fields.join(";");
        row.push_str(";SVWZ+Teilnehmerbeitrag DB-123-4 Max Mustermann");

        classify_statement(row.as_bytes(), &events, &roster).unwrap()
    }

    #[test]
    fn csv_rows_carry_the_best_candidates() {
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &classified()).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "t_id;date;amount;type;type_confidence;member_id;member_given_names;\
             member_family_name;member_confidence;event;event_confidence;\
             account_holder;posting;reference;problems"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("1;2024-03-01;150.00;event fee;full;DB-123-4;Max;Mustermann;full;"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn csv_quotes_fields_containing_the_delimiter() {
        let mut transactions = classified();
        transactions[0].reference = "Beitrag; Rest".to_string();

        let mut buffer = Vec::new();
        write_csv(&mut buffer, &transactions).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("\"Beitrag; Rest\""));
    }

    #[test]
    fn json_is_an_array_of_full_records() {
        let mut buffer = Vec::new();
        write_json(&mut buffer, &classified()).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        let rows = parsed.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["t_id"], 1);
        assert_eq!(rows[0]["cents"], 15_000);
        assert_eq!(rows[0]["transaction_type"], "EventFee");
        assert_eq!(rows[0]["best_member"][0]["id"], "DB-123-4");
        assert_eq!(rows[0]["member_matches"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn table_prints_one_dump_per_transaction() {
        let transactions = classified();

        let mut buffer = Vec::new();
        write_table(&mut buffer, &transactions).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("Transaction 1:"));
        assert!(text.contains("amount:         150,00"));
        assert!(text.contains("member:         DB-123-4 Max Mustermann (full)"));
    }
}
