pub use crate::config::*;

use crate::join_records;

/// A builder for assembling the areas and the vote rows of a join.
///
/// Convenient for tests and small programs, when the data does not come from files.
///
/// ```
/// pub use vote_join::builder::Builder;
/// pub use vote_join::JoinRules;
/// # use vote_join::JoinErrors;
///
/// let mut builder = Builder::new(&JoinRules::default())?
///     .candidates(&["Anna".to_string(), "Bob".to_string()])?;
///
/// builder.add_area("01", ())?;
/// builder.add_area("02", ())?;
/// builder.add_row_simple("1", &[30, 12])?;
///
/// let outcome = builder.join()?;
/// assert_eq!(outcome.records[0].metrics.as_ref().unwrap().winner.as_deref(), Some("Anna"));
/// assert!(outcome.records[1].metrics.is_none());
///
/// # Ok::<(), JoinErrors>(())
/// ```
pub struct Builder<G> {
    pub(crate) _rules: JoinRules,
    pub(crate) _areas: Vec<AreaRecord<G>>,
    pub(crate) _rows: Vec<VoteRow>,
}

impl<G: Clone> Builder<G> {
    pub fn new(rules: &JoinRules) -> Result<Builder<G>, JoinErrors> {
        Ok(Builder {
            _rules: rules.clone(),
            _areas: Vec::new(),
            _rows: Vec::new(),
        })
    }

    /// Sets the candidates, in order of precedence. The names are also the
    /// columns of the vote rows.
    pub fn candidates(self, cands: &[String]) -> Result<Builder<G>, JoinErrors> {
        let mut rules = self._rules;
        rules.candidates = cands.iter().map(|c| Candidate::from_field(c)).collect();
        Ok(Builder {
            _rules: rules,
            _areas: self._areas,
            _rows: self._rows,
        })
    }

    /// Adds an area identified by `id`, stored under the first area identifier field.
    pub fn add_area(&mut self, id: &str, geometry: G) -> Result<(), JoinErrors> {
        let field = self.first_field(&self._rules.area_id_fields, RecordSide::Area)?;
        let mut properties = Record::new();
        properties.insert(&field, Cell::from(id));
        self._areas.push(AreaRecord {
            properties,
            geometry,
        });
        Ok(())
    }

    /// Adds a vote row. The counts follow the order of the candidates; missing
    /// counts are left out of the row.
    pub fn add_row_simple(&mut self, id: &str, counts: &[u64]) -> Result<(), JoinErrors> {
        let field = self.first_field(&self._rules.vote_id_fields, RecordSide::Vote)?;
        let mut row = Record::new();
        row.insert(&field, Cell::from(id));
        for (c, count) in self._rules.candidates.iter().zip(counts.iter()) {
            row.insert(&c.field, Cell::from(*count));
        }
        self.add_row(row)
    }

    pub fn add_row(&mut self, row: VoteRow) -> Result<(), JoinErrors> {
        self._rows.push(row);
        Ok(())
    }

    pub fn join(&self) -> Result<JoinOutcome<G>, JoinErrors> {
        join_records(&self._areas, &self._rows, &self._rules)
    }

    fn first_field(&self, fields: &[String], side: RecordSide) -> Result<String, JoinErrors> {
        fields
            .first()
            .cloned()
            .ok_or_else(|| JoinErrors::MalformedInput {
                side,
                index: match side {
                    RecordSide::Area => self._areas.len(),
                    RecordSide::Vote => self._rows.len(),
                },
                tried: Vec::new(),
            })
    }
}
