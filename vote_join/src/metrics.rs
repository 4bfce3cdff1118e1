use log::{debug, warn};

use crate::config::*;

/// Reads a vote count out of a cell.
///
/// Source data is noisy (`"N/A"`, `"-"`, blank cells): anything that is not a
/// non-negative finite number counts as zero. Decimal values are rounded, and
/// values beyond the range of `u64` saturate.
pub fn coerce_count(cell: Option<&Cell>) -> u64 {
    match cell {
        Some(Cell::Text(s)) => match s.trim().parse::<u64>() {
            Ok(x) => x,
            Err(_) => count_of_float(coerce_value(cell)),
        },
        _ => count_of_float(coerce_value(cell)),
    }
}

/// Reads the unrounded value of a cell, with the same rules as [`coerce_count`].
pub fn coerce_value(cell: Option<&Cell>) -> f64 {
    let f = match cell {
        Some(Cell::Number(f)) => *f,
        Some(Cell::Text(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        Some(Cell::Empty) | None => 0.0,
    };
    if f.is_finite() && f > 0.0 {
        f
    } else {
        0.0
    }
}

// The cast saturates at u64::MAX.
fn count_of_float(f: f64) -> u64 {
    f.round() as u64
}

fn saturating_sum<I: Iterator<Item = u64>>(counts: I) -> u64 {
    counts.fold(0u64, |acc, x| acc.saturating_add(x))
}

/// Fills in the remainder candidate of a row that does not carry it.
///
/// The derived value is `whole` minus the values of the other candidates,
/// clamped to `[0, whole]`. Rows that already have the column are returned as is.
pub fn with_remainder(row: &VoteRow, candidates: &[Candidate], remainder: &Remainder) -> VoteRow {
    if row.get(&remainder.field).is_some() {
        return row.clone();
    }
    let whole = remainder.whole as f64;
    let others: f64 = candidates
        .iter()
        .filter(|c| c.field != remainder.field)
        .map(|c| coerce_value(row.get(&c.field)))
        .sum();
    let value = if others.is_finite() {
        (whole - others).max(0.0).min(whole)
    } else {
        0.0
    };
    debug!(
        "with_remainder: {} = {} - {} = {}",
        remainder.field, whole, others, value
    );
    let mut res = row.clone();
    res.insert(&remainder.field, Cell::Number(value));
    res
}

/// Computes the winner, runner-up and margin of a vote row.
///
/// Candidates are ranked on their rounded counts, and candidates with the
/// same rounded count on their unrounded values, so that `45.4` ranks above
/// `45.2` in percentage tables.
///
/// Arguments:
/// * `row` the vote counts
/// * `candidates` the candidates, in order of precedence: when two candidates
/// have the same value, the first listed one ranks higher.
/// * `auxiliary_fields` counts that are added to the total without competing
/// (blank, null or void ballots)
/// * `total_field` an optional column with a pre-aggregated total
pub fn compute_metrics(
    row: &VoteRow,
    candidates: &[Candidate],
    auxiliary_fields: &[String],
    total_field: Option<&str>,
) -> Metrics {
    let mut tally: Vec<(&Candidate, u64, f64)> = candidates
        .iter()
        .map(|c| {
            let cell = row.get(&c.field);
            (c, coerce_count(cell), coerce_value(cell))
        })
        .collect();
    // The sort is stable: ties keep the order of the candidate list.
    // Rounding never inverts the order of two values, so the second key only
    // separates equal counts.
    tally.sort_by(|a, b| b.1.cmp(&a.1).then(b.2.total_cmp(&a.2)));

    let (winner, winner_votes) = match tally.first() {
        Some((c, count, _)) => (Some(c.name.clone()), *count),
        None => (None, 0),
    };
    let (runner_up, runner_up_votes) = match tally.get(1) {
        Some((c, count, _)) => (Some(c.name.clone()), *count),
        None => (None, 0),
    };

    let candidate_sum = saturating_sum(tally.iter().map(|(_, count, _)| *count));
    let auxiliary_sum = saturating_sum(auxiliary_fields.iter().map(|f| coerce_count(row.get(f))));
    let summed_total = candidate_sum.saturating_add(auxiliary_sum);

    let explicit_total = total_field.map(|f| coerce_count(row.get(f))).unwrap_or(0);
    let total = if explicit_total == 0 {
        summed_total
    } else if explicit_total < candidate_sum {
        warn!(
            "compute_metrics: explicit total {} is below the candidate votes {}, using the sum {}",
            explicit_total, candidate_sum, summed_total
        );
        summed_total
    } else {
        explicit_total
    };

    let res = Metrics {
        total,
        winner,
        winner_votes,
        runner_up,
        runner_up_votes,
        margin: winner_votes - runner_up_votes,
    };
    debug!("compute_metrics: {:?}", res);
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn cands(names: &[&str]) -> Vec<Candidate> {
        names.iter().map(|n| Candidate::from_field(n)).collect()
    }

    #[test]
    fn coercion() {
        assert_eq!(coerce_count(None), 0);
        assert_eq!(coerce_count(Some(&Cell::Empty)), 0);
        assert_eq!(coerce_count(Some(&Cell::from("N/A"))), 0);
        assert_eq!(coerce_count(Some(&Cell::from(" 120 "))), 120);
        assert_eq!(coerce_count(Some(&Cell::from("12.6"))), 13);
        assert_eq!(coerce_count(Some(&Cell::from("-4"))), 0);
        assert_eq!(coerce_count(Some(&Cell::Number(f64::INFINITY))), 0);
        assert_eq!(coerce_count(Some(&Cell::Number(42.0))), 42);
        assert_eq!(coerce_count(Some(&Cell::from("1e30"))), u64::MAX);
        assert_eq!(coerce_value(Some(&Cell::from(" 45.4 "))), 45.4);
        assert_eq!(coerce_value(Some(&Cell::from("-1.5"))), 0.0);
        assert_eq!(coerce_value(Some(&Cell::Number(f64::NAN))), 0.0);
    }

    #[test]
    fn huge_counts_saturate() {
        init();
        let row = Record::from_pairs(vec![("A", "1e30"), ("B", "1e30"), ("BLANCO", "1e30")]);
        let aux = vec!["BLANCO".to_string()];
        let m = compute_metrics(&row, &cands(&["A", "B"]), &aux, None);
        assert_eq!(m.winner, Some("A".to_string()));
        assert_eq!(m.winner_votes, u64::MAX);
        assert_eq!(m.runner_up_votes, u64::MAX);
        assert_eq!(m.margin, 0);
        assert_eq!(m.total, u64::MAX);

        let row2 = Record::from_pairs(vec![("A", "1e30"), ("B", "5"), ("TOTAL", "12")]);
        let m2 = compute_metrics(&row2, &cands(&["A", "B"]), &[], Some("TOTAL"));
        assert_eq!(m2.total, u64::MAX);
        assert_eq!(m2.margin, u64::MAX - 5);
    }

    #[test]
    fn rounded_ties_use_the_unrounded_values() {
        init();
        let pct = vec![
            Candidate::from_prefixed_field("%_Eder", "%_"),
            Candidate::from_prefixed_field("%_Ortiz", "%_"),
        ];
        let row = Record::from_pairs(vec![("%_Eder", "45.2"), ("%_Ortiz", "45.4")]);
        let m = compute_metrics(&row, &pct, &[], None);
        assert_eq!(m.winner, Some("Ortiz".to_string()));
        assert_eq!(m.runner_up, Some("Eder".to_string()));
        assert_eq!(m.winner_votes, 45);
        assert_eq!(m.margin, 0);

        // Different rounded counts are ranked as before.
        let row2 = Record::from_pairs(vec![("%_Eder", "46.6"), ("%_Ortiz", "45.4")]);
        assert_eq!(
            compute_metrics(&row2, &pct, &[], None).winner,
            Some("Eder".to_string())
        );
    }

    #[test]
    fn derived_remainder() {
        init();
        let pct = vec![
            Candidate::from_prefixed_field("%_Eder", "%_"),
            Candidate::from_prefixed_field("%_Ortiz", "%_"),
            Candidate::from_prefixed_field("%_otros", "%_"),
        ];
        let rem = Remainder {
            field: "%_otros".to_string(),
            whole: 100,
        };
        let row = Record::from_pairs(vec![("%_Eder", "40.25"), ("%_Ortiz", "35")]);
        let filled = with_remainder(&row, &pct, &rem);
        assert_eq!(filled.get("%_otros"), Some(&Cell::Number(24.75)));
        let m = compute_metrics(&filled, &pct, &[], None);
        assert_eq!(m.winner, Some("Eder".to_string()));
        assert_eq!(m.runner_up, Some("Ortiz".to_string()));
        assert_eq!(m.total, 100);

        // Clamped to the whole.
        let over = Record::from_pairs(vec![("%_Eder", "70"), ("%_Ortiz", "45")]);
        assert_eq!(
            with_remainder(&over, &pct, &rem).get("%_otros"),
            Some(&Cell::Number(0.0))
        );
        let blank = Record::from_pairs(vec![("%_Eder", "N/A")]);
        assert_eq!(
            with_remainder(&blank, &pct, &rem).get("%_otros"),
            Some(&Cell::Number(100.0))
        );

        // A row with the column keeps its own value.
        let given = Record::from_pairs(vec![("%_Eder", "40"), ("%_Ortiz", "35"), ("%_otros", "")]);
        assert_eq!(with_remainder(&given, &pct, &rem), given);
    }

    #[test]
    fn simple_winner() {
        init();
        let row = Record::from_pairs(vec![("id", "03"), ("CandidateA", "120"), ("CandidateB", "80")]);
        let m = compute_metrics(&row, &cands(&["CandidateA", "CandidateB"]), &[], None);
        assert_eq!(
            m,
            Metrics {
                total: 200,
                winner: Some("CandidateA".to_string()),
                winner_votes: 120,
                runner_up: Some("CandidateB".to_string()),
                runner_up_votes: 80,
                margin: 40,
            }
        );
    }

    #[test]
    fn non_numeric_is_zero() {
        init();
        let row = Record::from_pairs(vec![("CandidateA", "N/A"), ("CandidateB", "50")]);
        let m = compute_metrics(&row, &cands(&["CandidateA", "CandidateB"]), &[], None);
        assert_eq!(m.winner, Some("CandidateB".to_string()));
        assert_eq!(m.runner_up, Some("CandidateA".to_string()));
        assert_eq!(m.runner_up_votes, 0);
        assert_eq!(m.margin, 50);
        assert_eq!(m.total, 50);
    }

    #[test]
    fn tie_goes_to_first_listed() {
        init();
        let row = Record::from_pairs(vec![("CandidateB", 50u64), ("CandidateA", 50u64)]);
        let m = compute_metrics(&row, &cands(&["CandidateA", "CandidateB"]), &[], None);
        assert_eq!(m.winner, Some("CandidateA".to_string()));
        assert_eq!(m.margin, 0);
        let m2 = compute_metrics(&row, &cands(&["CandidateB", "CandidateA"]), &[], None);
        assert_eq!(m2.winner, Some("CandidateB".to_string()));
    }

    #[test]
    fn zero_total() {
        init();
        let row = Record::from_pairs(vec![("A", "0"), ("B", "")]);
        let m = compute_metrics(&row, &cands(&["A", "B"]), &[], None);
        assert_eq!(m.total, 0);
        assert_eq!(m.margin, 0);
        assert_eq!(m.margin_share(), 0.0);
        assert_eq!(m.winner, Some("A".to_string()));
    }

    #[test]
    fn auxiliary_counts() {
        init();
        let row = Record::from_pairs(vec![
            ("A", "10"),
            ("B", "5"),
            ("C", "7"),
            ("BLANCO", "3"),
            ("NULOS", "x"),
        ]);
        let aux = vec!["BLANCO".to_string(), "NULOS".to_string()];
        let m = compute_metrics(&row, &cands(&["A", "B", "C"]), &aux, None);
        assert_eq!(m.total, 25);
        assert_eq!(m.runner_up, Some("C".to_string()));
        assert_eq!(m.margin, 3);
        assert!((m.margin_share() - 0.12).abs() < 1e-9);
    }

    #[test]
    fn explicit_total() {
        init();
        let row = Record::from_pairs(vec![("A", "10"), ("B", "5"), ("TOTAL", "40")]);
        let m = compute_metrics(&row, &cands(&["A", "B"]), &[], Some("TOTAL"));
        assert_eq!(m.total, 40);

        // Zero or missing: fall back to the sum.
        let row0 = Record::from_pairs(vec![("A", "10"), ("B", "5"), ("TOTAL", "0")]);
        assert_eq!(compute_metrics(&row0, &cands(&["A", "B"]), &[], Some("TOTAL")).total, 15);
        assert_eq!(compute_metrics(&row0, &cands(&["A", "B"]), &[], Some("MISSING")).total, 15);

        // Inconsistent: the sum wins.
        let row1 = Record::from_pairs(vec![("A", "10"), ("B", "5"), ("TOTAL", "12")]);
        assert_eq!(compute_metrics(&row1, &cands(&["A", "B"]), &[], Some("TOTAL")).total, 15);
    }

    #[test]
    fn degenerate_candidate_lists() {
        init();
        let row = Record::from_pairs(vec![("A", "10")]);
        let m = compute_metrics(&row, &cands(&["A"]), &[], None);
        assert_eq!(m.winner, Some("A".to_string()));
        assert_eq!(m.runner_up, None);
        assert_eq!(m.margin, 10);

        let empty = compute_metrics(&row, &[], &[], None);
        assert_eq!(empty.winner, None);
        assert_eq!(empty.total, 0);
    }

    #[test]
    fn invariants_hold() {
        init();
        let values = ["0", "1", "N/A", "17", "17", "-3", "250", "2.4", "2.6", "1e30"];
        for (i, a) in values.iter().enumerate() {
            for b in values.iter().skip(i) {
                for c in values.iter() {
                    let row = Record::from_pairs(vec![("A", *a), ("B", *b), ("C", *c)]);
                    let m = compute_metrics(&row, &cands(&["A", "B", "C"]), &[], None);
                    assert!(m.winner_votes >= m.runner_up_votes);
                    assert_eq!(m.margin, m.winner_votes - m.runner_up_votes);
                    assert!(m.total >= m.winner_votes.saturating_add(m.runner_up_votes));
                }
            }
        }
    }
}
