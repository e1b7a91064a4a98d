//! Converts a column schema into absolute widths that add up to the usable
//! page width.

use std::cmp::Ordering;

use super::column_schema::{Column, ColumnKind};

/// Smallest share of the usable width a dynamic column may receive.
pub const MIN_DYNAMIC_SHARE: f32 = 0.05;

/// Absolute lower bound for any column, in layout units.
pub const MIN_COLUMN_WIDTH: f32 = 5.0;

#[derive(Debug, Clone, Copy)]
pub struct ColumnWidthAllocator {
    pub min_dynamic_share: f32,
    pub min_column_width: f32,
}

impl Default for ColumnWidthAllocator {
    fn default() -> Self {
        Self {
            min_dynamic_share: MIN_DYNAMIC_SHARE,
            min_column_width: MIN_COLUMN_WIDTH,
        }
    }
}

impl ColumnWidthAllocator {
    /// Widths in schema order. The result always sums to `usable_width`.
    pub fn allocate(&self, usable_width: f32, columns: &[Column]) -> Vec<f32> {
        if columns.is_empty() {
            return Vec::new();
        }
        let usable_width = usable_width.max(0.0);

        let mut widths: Vec<f32> = self
            .relative_weights(columns)
            .into_iter()
            .map(|weight| weight * usable_width)
            .collect();
        self.apply_floor(&mut widths, usable_width);
        distribute_rounding(&mut widths, usable_width);
        widths
    }

    /// Normalised weights (summing to 1) after dynamic columns are sized and
    /// any slack is folded into the absorbing column.
    pub fn relative_weights(&self, columns: &[Column]) -> Vec<f32> {
        let dynamic_count = columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Dynamic)
            .count();
        let fixed_sum: f32 = columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Fixed)
            .map(|c| c.relative_weight.unwrap_or(0.0))
            .sum();
        let dynamic_share = (1.0 - fixed_sum).max(0.0);

        let mut weights: Vec<f32> = columns
            .iter()
            .map(|c| match c.kind {
                ColumnKind::Fixed => c.relative_weight.unwrap_or(0.0),
                ColumnKind::Dynamic => 0.0,
            })
            .collect();

        if dynamic_count > 0 {
            let mut per_dynamic = dynamic_share / dynamic_count as f32;
            if per_dynamic < self.min_dynamic_share {
                let dynamic_total = (self.min_dynamic_share * dynamic_count as f32).min(1.0);
                let fixed_scale = if fixed_sum > 0.0 {
                    (1.0 - dynamic_total) / fixed_sum
                } else {
                    0.0
                };
                for (weight, column) in weights.iter_mut().zip(columns) {
                    if column.kind == ColumnKind::Fixed {
                        *weight *= fixed_scale;
                    }
                }
                per_dynamic = dynamic_total / dynamic_count as f32;
            }
            for (weight, column) in weights.iter_mut().zip(columns) {
                if column.kind == ColumnKind::Dynamic {
                    *weight = per_dynamic;
                }
            }
        } else if let Some(index) = columns.iter().position(Column::absorbs_slack) {
            weights[index] += dynamic_share;
        }

        let total: f32 = weights.iter().sum();
        if total > 0.0 {
            weights.iter_mut().for_each(|w| *w /= total);
        } else {
            let even = 1.0 / columns.len() as f32;
            weights.iter_mut().for_each(|w| *w = even);
        }
        weights
    }

    /// Raises narrow columns to the floor, taking the shortfall from the
    /// other columns in proportion to how far they sit above it.
    fn apply_floor(&self, widths: &mut [f32], total: f32) {
        let floor = self.min_column_width;
        let count = widths.len() as f32;
        if floor * count > total {
            widths.iter_mut().for_each(|w| *w = total / count);
            return;
        }

        let deficit: f32 = widths
            .iter()
            .filter(|w| **w < floor)
            .map(|w| floor - *w)
            .sum();
        if deficit <= 0.0 {
            return;
        }
        let excess: f32 = widths
            .iter()
            .filter(|w| **w > floor)
            .map(|w| *w - floor)
            .sum();

        for width in widths.iter_mut() {
            if *width < floor {
                *width = floor;
            } else if excess > 0.0 {
                *width -= deficit * (*width - floor) / excess;
            }
        }
    }
}

/// Quantises widths to hundredths with the largest-remainder method, then
/// puts any float residue on the widest column so the sum equals `total`.
fn distribute_rounding(widths: &mut [f32], total: f32) {
    let target_units = (f64::from(total) * 100.0).round() as i64;
    let raw: Vec<f64> = widths.iter().map(|w| f64::from(*w) * 100.0).collect();
    let mut units: Vec<i64> = raw.iter().map(|r| r.floor() as i64).collect();

    let mut order: Vec<usize> = (0..widths.len()).collect();
    order.sort_by(|&a, &b| {
        let frac_a = raw[a] - raw[a].floor();
        let frac_b = raw[b] - raw[b].floor();
        frac_b
            .partial_cmp(&frac_a)
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut remaining = target_units - units.iter().sum::<i64>();
    let mut cursor = 0;
    while remaining > 0 {
        units[order[cursor % order.len()]] += 1;
        remaining -= 1;
        cursor += 1;
    }
    while remaining < 0 {
        if let Some(widest) = widest_index(&units) {
            units[widest] -= 1;
        }
        remaining += 1;
    }

    for (width, unit) in widths.iter_mut().zip(&units) {
        *width = *unit as f32 / 100.0;
    }

    let residue = total - widths.iter().sum::<f32>();
    if residue != 0.0 {
        if let Some(widest) = widest_index(widths) {
            widths[widest] += residue;
        }
    }
}

fn widest_index<T: PartialOrd + Copy>(values: &[T]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(Ordering::Equal))
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{PeriodType, RecordId, SequenceDetail, SubjectResult, TermDetail},
        services::{
            report_card::column_schema::{ColumnKey, ColumnSchemaBuilder, FixedColumn},
            translator::Catalog,
        },
    };

    const EPSILON: f32 = 1e-3;

    fn subjects_with_periods(period_type: PeriodType, count: usize) -> Vec<SubjectResult> {
        let mut subject = SubjectResult {
            subject_id: RecordId::from("math"),
            subject_name: "Mathematics".into(),
            coefficient: 4.0,
            score: Some(14.0),
            rank: Some(2),
            class_average_subject: Some(11.0),
            teacher_name: None,
            sequence_details: Vec::new(),
            term_details: Vec::new(),
        };
        for i in 0..count {
            match period_type {
                PeriodType::Term => subject.sequence_details.push(SequenceDetail {
                    sequence_id: RecordId::Number(i as i64),
                    sequence_name: format!("Sequence {}", i + 1),
                    normalized_score: Some(12.0),
                    weight: None,
                    is_absent: false,
                    rank: None,
                }),
                PeriodType::Year => subject.term_details.push(TermDetail {
                    term_id: RecordId::Number(i as i64),
                    term_name: format!("Term {}", i + 1),
                    term_average_score: Some(12.0),
                    weight: None,
                    is_absent: false,
                    rank: None,
                }),
                PeriodType::Sequence => {}
            }
        }
        vec![subject]
    }

    fn columns(period_type: PeriodType, dynamic: usize) -> Vec<Column> {
        let subjects = subjects_with_periods(period_type, dynamic);
        ColumnSchemaBuilder::build(period_type, &subjects, &Catalog::english()).columns
    }

    #[test]
    fn widths_always_sum_to_usable_width() {
        let allocator = ColumnWidthAllocator::default();
        let cases = [
            (PeriodType::Sequence, 0),
            (PeriodType::Term, 0),
            (PeriodType::Term, 1),
            (PeriodType::Term, 5),
            (PeriodType::Term, 20),
            (PeriodType::Year, 0),
            (PeriodType::Year, 1),
            (PeriodType::Year, 5),
            (PeriodType::Year, 20),
        ];

        for (period_type, dynamic) in cases {
            for usable in [182.0_f32, 100.0, 267.0, 181.237] {
                let cols = columns(period_type, dynamic);
                let widths = allocator.allocate(usable, &cols);
                assert_eq!(widths.len(), cols.len());
                let sum: f32 = widths.iter().sum();
                assert!(
                    (sum - usable).abs() < EPSILON,
                    "{period_type:?}/{dynamic} at {usable}: sum {sum}"
                );
                if cols.len() as f32 * MIN_COLUMN_WIDTH <= usable {
                    for width in &widths {
                        assert!(*width >= MIN_COLUMN_WIDTH - EPSILON, "{width} below floor");
                    }
                }
            }
        }
    }

    #[test]
    fn teacher_absorbs_unused_dynamic_share() {
        let allocator = ColumnWidthAllocator::default();
        let cols = columns(PeriodType::Sequence, 0);
        let widths = allocator.allocate(182.0, &cols);
        let teacher = cols
            .iter()
            .position(|c| c.key == ColumnKey::Fixed(FixedColumn::Teacher))
            .unwrap();
        // 0.12 + (1 - 0.74)
        assert!((widths[teacher] - 0.38 * 182.0).abs() < 0.02);
        let subject = widths[0];
        assert!((subject - 0.20 * 182.0).abs() < 0.02);
    }

    #[test]
    fn single_dynamic_column_takes_remaining_share() {
        let allocator = ColumnWidthAllocator::default();
        let cols = columns(PeriodType::Term, 1);
        let weights = allocator.relative_weights(&cols);
        assert!((weights[2] - 0.34).abs() < 1e-4);
        assert!((weights[0] - 0.20).abs() < 1e-4);
    }

    #[test]
    fn many_dynamic_columns_are_clamped_to_minimum_share() {
        let allocator = ColumnWidthAllocator::default();
        let cols = columns(PeriodType::Term, 10);
        let weights = allocator.relative_weights(&cols);
        for (weight, column) in weights.iter().zip(&cols) {
            if column.kind == ColumnKind::Dynamic {
                assert!((weight - 0.05).abs() < 1e-4);
            }
        }
        let total: f32 = weights.iter().sum();
        assert!((total - 1.0).abs() < 1e-4);
        // fixed columns share the remaining half in their original ratio
        assert!((weights[0] / weights[1] - 4.0).abs() < 1e-3);
    }

    #[test]
    fn narrow_page_falls_back_to_equal_widths() {
        let allocator = ColumnWidthAllocator::default();
        let cols = columns(PeriodType::Term, 5);
        let widths = allocator.allocate(40.0, &cols);
        let sum: f32 = widths.iter().sum();
        assert!((sum - 40.0).abs() < EPSILON);
        let expected = 40.0 / cols.len() as f32;
        for width in widths {
            assert!((width - expected).abs() < 0.02);
        }
    }

    #[test]
    fn empty_schema_allocates_nothing() {
        let allocator = ColumnWidthAllocator::default();
        assert!(allocator.allocate(182.0, &[]).is_empty());
    }
}
