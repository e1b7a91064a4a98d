//! Column schema of the subject breakdown table.
//!
//! The fixed columns depend only on the period type. The dynamic columns are
//! the union of the period entries nested under every subject
//! (`sequence_details` for a term, `term_details` for a year), deduplicated by
//! id and sorted by name.
//!
//! Complexity: building the union is O(S·D) for S subjects with at most D
//! details each. Mapping rows indexes each subject's details once, so the
//! cell pass is O(S·(D + C)) for C dynamic columns.

use std::{
    cmp::Ordering,
    collections::HashMap,
    iter::Peekable,
    str::Chars,
};

use crate::{
    models::{PeriodDetail, PeriodType, RecordId, SubjectResult},
    services::translator::Translate,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedColumn {
    Subject,
    Coefficient,
    Score,
    Rank,
    ClassAverage,
    Remarks,
    Teacher,
}

impl FixedColumn {
    /// Share of the usable width before any dynamic column is considered.
    pub fn relative_weight(&self) -> f32 {
        match self {
            FixedColumn::Subject => 0.20,
            FixedColumn::Coefficient => 0.05,
            FixedColumn::Score => 0.07,
            FixedColumn::Rank => 0.06,
            FixedColumn::ClassAverage => 0.08,
            FixedColumn::Remarks => 0.16,
            FixedColumn::Teacher => 0.12,
        }
    }

    pub fn header_key(&self) -> &'static str {
        match self {
            FixedColumn::Subject => "table.subject",
            FixedColumn::Coefficient => "table.coefficient",
            FixedColumn::Score => "table.score",
            FixedColumn::Rank => "table.rank",
            FixedColumn::ClassAverage => "table.class_average",
            FixedColumn::Remarks => "table.remarks",
            FixedColumn::Teacher => "table.teacher",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnKey {
    Fixed(FixedColumn),
    Period(RecordId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Fixed,
    Dynamic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub key: ColumnKey,
    pub header: String,
    pub kind: ColumnKind,
    pub relative_weight: Option<f32>,
}

impl Column {
    fn fixed(column: FixedColumn, translator: &dyn Translate) -> Self {
        Self {
            key: ColumnKey::Fixed(column),
            header: translator.translate(column.header_key(), &[]),
            kind: ColumnKind::Fixed,
            relative_weight: Some(column.relative_weight()),
        }
    }

    /// Header is the period name, followed by its weight when any period of
    /// the table carries one.
    fn dynamic(period: &DynamicColumn, show_weight: bool, translator: &dyn Translate) -> Self {
        let header = if show_weight {
            let weight = period
                .weight
                .map(format_weight)
                .unwrap_or_else(|| translator.translate("cell.not_applicable", &[]));
            translator.translate(
                "table.period_weight",
                &[("name", period.name.clone()), ("weight", weight)],
            )
        } else {
            period.name.clone()
        };
        Self {
            key: ColumnKey::Period(period.id.clone()),
            header,
            kind: ColumnKind::Dynamic,
            relative_weight: None,
        }
    }

    /// The teacher column takes whatever width the dynamic columns leave unused.
    pub fn absorbs_slack(&self) -> bool {
        self.key == ColumnKey::Fixed(FixedColumn::Teacher)
    }
}

/// One reporting sub-period that becomes a table column.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicColumn {
    pub id: RecordId,
    pub name: String,
    /// First weight any subject reports for this period.
    pub weight: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    pub period_type: PeriodType,
    pub periods: Vec<DynamicColumn>,
    pub columns: Vec<Column>,
}

impl ColumnSchema {
    pub fn dynamic_count(&self) -> usize {
        self.periods.len()
    }

    pub fn position(&self, column: FixedColumn) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.key == ColumnKey::Fixed(column))
    }
}

/// Content of a dynamic cell for one subject.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PeriodCell {
    Score(f32),
    Absent,
    /// The subject has the period but no score yet.
    NotRecorded,
    /// The period exists for other subjects only.
    NotApplicable,
}

pub struct ColumnSchemaBuilder;

impl ColumnSchemaBuilder {
    pub fn dynamic_columns(
        period_type: PeriodType,
        subjects: &[SubjectResult],
    ) -> Vec<DynamicColumn> {
        match period_type {
            PeriodType::Sequence => Vec::new(),
            PeriodType::Term => {
                union_sorted(subjects.iter().flat_map(|s| s.sequence_details.iter()))
            }
            PeriodType::Year => union_sorted(subjects.iter().flat_map(|s| s.term_details.iter())),
        }
    }

    pub fn build(
        period_type: PeriodType,
        subjects: &[SubjectResult],
        translator: &dyn Translate,
    ) -> ColumnSchema {
        let periods = Self::dynamic_columns(period_type, subjects);

        let mut columns = vec![
            Column::fixed(FixedColumn::Subject, translator),
            Column::fixed(FixedColumn::Coefficient, translator),
        ];
        let show_weight = periods.iter().any(|period| period.weight.is_some());
        columns.extend(
            periods
                .iter()
                .map(|period| Column::dynamic(period, show_weight, translator)),
        );
        columns.push(Column::fixed(FixedColumn::Score, translator));
        columns.push(Column::fixed(FixedColumn::Rank, translator));
        if period_type == PeriodType::Sequence {
            columns.push(Column::fixed(FixedColumn::ClassAverage, translator));
        }
        columns.push(Column::fixed(FixedColumn::Remarks, translator));
        columns.push(Column::fixed(FixedColumn::Teacher, translator));

        ColumnSchema {
            period_type,
            periods,
            columns,
        }
    }

    /// One cell per dynamic column, in column order, for `subject`.
    pub fn period_cells(
        period_type: PeriodType,
        subject: &SubjectResult,
        periods: &[DynamicColumn],
    ) -> Vec<PeriodCell> {
        match period_type {
            PeriodType::Sequence => Vec::new(),
            PeriodType::Term => match_cells(&subject.sequence_details, periods),
            PeriodType::Year => match_cells(&subject.term_details, periods),
        }
    }
}

fn union_sorted<'a, D>(details: impl Iterator<Item = &'a D>) -> Vec<DynamicColumn>
where
    D: PeriodDetail + 'a,
{
    let mut positions: HashMap<&RecordId, usize> = HashMap::new();
    let mut columns: Vec<DynamicColumn> = Vec::new();
    for detail in details {
        match positions.get(detail.period_id()) {
            Some(&index) => {
                let column = &mut columns[index];
                column.weight = column.weight.or(detail.weight());
            }
            None => {
                positions.insert(detail.period_id(), columns.len());
                columns.push(DynamicColumn {
                    id: detail.period_id().clone(),
                    name: detail.period_name().to_string(),
                    weight: detail.weight(),
                });
            }
        }
    }
    columns.sort_by(|a, b| natural_cmp(&a.name, &b.name).then_with(|| a.id.cmp(&b.id)));
    columns
}

fn match_cells<D: PeriodDetail>(details: &[D], periods: &[DynamicColumn]) -> Vec<PeriodCell> {
    let index: HashMap<&RecordId, &D> = details.iter().map(|d| (d.period_id(), d)).collect();
    periods
        .iter()
        .map(|period| match index.get(&period.id) {
            None => PeriodCell::NotApplicable,
            Some(detail) if detail.is_absent() => PeriodCell::Absent,
            Some(detail) => detail
                .period_score()
                .map(PeriodCell::Score)
                .unwrap_or(PeriodCell::NotRecorded),
        })
        .collect()
}

/// Case- and accent-insensitive comparison where runs of digits compare by
/// value, so "Sequence 2" sorts before "Sequence 10" and "Évaluation" sorts
/// with the other "E" names. Accents are folded for Latin letters only; other
/// scripts compare by code point.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        let (l, r) = match (left.peek().copied(), right.peek().copied()) {
            (None, None) => break,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => (l, r),
        };

        if l.is_ascii_digit() && r.is_ascii_digit() {
            let l_digits = take_digits(&mut left);
            let r_digits = take_digits(&mut right);
            let l_trimmed = l_digits.trim_start_matches('0');
            let r_trimmed = r_digits.trim_start_matches('0');
            let ordering = l_trimmed
                .len()
                .cmp(&r_trimmed.len())
                .then_with(|| l_trimmed.cmp(r_trimmed));
            if ordering != Ordering::Equal {
                return ordering;
            }
            continue;
        }

        let ordering = fold_accent(l)
            .to_lowercase()
            .cmp(fold_accent(r).to_lowercase());
        if ordering != Ordering::Equal {
            return ordering;
        }
        left.next();
        right.next();
    }

    a.cmp(b)
}

fn format_weight(weight: f32) -> String {
    if weight.fract() == 0.0 {
        format!("{weight:.0}")
    } else {
        format!("{weight:.2}")
    }
}

/// Base letter of an accented Latin letter.
fn fold_accent(ch: char) -> char {
    match ch {
        'À'..='Å' => 'A',
        'à'..='å' => 'a',
        'Ç' => 'C',
        'ç' => 'c',
        'È'..='Ë' => 'E',
        'è'..='ë' => 'e',
        'Ì'..='Ï' => 'I',
        'ì'..='ï' => 'i',
        'Ñ' => 'N',
        'ñ' => 'n',
        'Ò'..='Ö' | 'Ø' => 'O',
        'ò'..='ö' | 'ø' => 'o',
        'Ù'..='Ü' => 'U',
        'ù'..='ü' => 'u',
        'Ý' => 'Y',
        'ý' | 'ÿ' => 'y',
        'Œ' => 'O',
        'œ' => 'o',
        _ => ch,
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(ch) = chars.next_if(|c| c.is_ascii_digit()) {
        digits.push(ch);
    }
    digits
}
