//! Column store: every object of a level, bucketed by horizontal position.
//!
//! ## Layout
//!
//! `columns[i]` holds every object whose `x == i`, in insertion order.
//! There are always `width + 1` columns. The store is append-only; the
//! only destructive operation is shrinking via [`ColumnStore::set_width`],
//! which drops whole trailing columns.
//!
//! ## Queries
//!
//!   - [`ColumnStore::objects_at`] — two neighbouring columns, unfiltered.
//!   - [`ColumnStore::objects_in`] — coarse column sweep widened by one
//!     column on each side, then an exact filter on the stored `x`.

use crate::domain::object::{LevelObject, ObjectKind};
use crate::error::{LevelError, LevelResult};

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ColumnStore {
    columns: Vec<Vec<LevelObject>>,
}

/// Column count for a requested width, or `InvalidWidth`.
fn column_count_for(width: i32) -> LevelResult<usize> {
    width
        .checked_add(1)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or(LevelError::InvalidWidth(width))
}

impl ColumnStore {
    /// `width + 1` empty columns.
    pub fn new(width: i32) -> LevelResult<Self> {
        let count = column_count_for(width)?;
        Ok(ColumnStore { columns: vec![Vec::new(); count] })
    }

    /// Wrap columns reconstructed by a decoder, as-is.
    pub(crate) fn from_columns(columns: Vec<Vec<LevelObject>>) -> Self {
        ColumnStore { columns }
    }

    /// Resize to `width + 1` columns. Shrinking discards trailing columns
    /// together with their objects.
    pub fn set_width(&mut self, width: i32) -> LevelResult<()> {
        let count = column_count_for(width)?;
        if count < self.columns.len() {
            let dropped: usize = self.columns[count..].iter().map(Vec::len).sum();
            if dropped > 0 {
                log::debug!("set_width({width}) discards {dropped} objects");
            }
            self.columns.truncate(count);
        } else {
            self.columns.resize_with(count, Vec::new);
        }
        Ok(())
    }

    /// Append `obj` to the end of column `obj.x`.
    pub fn add_object(&mut self, obj: LevelObject) -> LevelResult<()> {
        let x = obj.x();
        let columns = self.columns.len();
        let column = usize::try_from(x)
            .ok()
            .and_then(|i| self.columns.get_mut(i))
            .ok_or(LevelError::ColumnOutOfRange { x, columns })?;
        column.push(obj);
        Ok(())
    }

    /// Column `max(1, x) - 1` followed by column `max(1, x)`.
    ///
    /// Both columns are returned whole. Columns past the end contribute
    /// nothing.
    pub fn objects_at(&self, x: i32) -> Vec<&LevelObject> {
        let x = x.max(1) as usize;
        let mut result = Vec::new();
        for idx in [x - 1, x] {
            if let Some(column) = self.columns.get(idx) {
                result.extend(column.iter());
            }
        }
        result
    }

    /// Objects whose stored x lies in `[x - 1, x + width)`.
    ///
    /// Columns `x - 2 ..= x + width` are swept first (out-of-range indices
    /// skipped), then filtered on each object's own x. Output follows
    /// column order, then insertion order.
    pub fn objects_in(&self, x: i32, width: i32) -> Vec<&LevelObject> {
        let start = i64::from(x) - 1;
        let end = i64::from(x) + i64::from(width);
        let first = (start - 1).max(0);
        let last = end.min(self.columns.len() as i64 - 1);

        let mut result = Vec::new();
        for idx in first..=last {
            for obj in &self.columns[idx as usize] {
                let ox = i64::from(obj.x());
                if ox >= start && ox < end {
                    result.push(obj);
                }
            }
        }
        result
    }

    // ── Read-only view ──

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// `column_count() - 1`; `-1` for a store with no columns.
    pub fn width(&self) -> i32 {
        self.columns.len() as i32 - 1
    }

    pub fn column(&self, x: usize) -> Option<&[LevelObject]> {
        self.columns.get(x).map(Vec::as_slice)
    }

    pub fn columns(&self) -> impl Iterator<Item = &[LevelObject]> {
        self.columns.iter().map(Vec::as_slice)
    }

    /// All objects, column by column, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &LevelObject> {
        self.columns.iter().flatten()
    }

    pub fn object_count(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    pub fn count_of(&self, kind: ObjectKind) -> usize {
        self.iter().filter(|o| o.kind() == kind).count()
    }

    /// Objects sitting in a column other than their own x.
    pub fn misplaced(&self) -> usize {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, col)| col.iter().filter(|o| o.x() as i64 != i as i64).count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::object::GridPos;

    fn xs(objs: &[&LevelObject]) -> Vec<i32> {
        objs.iter().map(|o| o.x()).collect()
    }

    /// One solid block per column `0..=width`, plus a spike in every even column.
    fn filled(width: i32) -> ColumnStore {
        let mut store = ColumnStore::new(width).unwrap();
        for x in 0..=width {
            store.add_object(LevelObject::solid_block(x, 0)).unwrap();
            if x % 2 == 0 {
                store.add_object(LevelObject::spike(x, 1)).unwrap();
            }
        }
        store
    }

    #[test]
    fn new_has_width_plus_one_columns() {
        for w in [0, 1, 7, 100] {
            let store = ColumnStore::new(w).unwrap();
            assert_eq!(store.column_count(), (w + 1) as usize);
            assert_eq!(store.width(), w);
        }
    }

    #[test]
    fn minus_one_width_is_empty_store() {
        let store = ColumnStore::new(-1).unwrap();
        assert_eq!(store.column_count(), 0);
    }

    #[test]
    fn negative_width_is_rejected() {
        assert!(matches!(ColumnStore::new(-2), Err(LevelError::InvalidWidth(-2))));
        assert!(matches!(ColumnStore::new(i32::MIN), Err(LevelError::InvalidWidth(_))));
        assert!(matches!(ColumnStore::new(i32::MAX), Err(LevelError::InvalidWidth(_))));
    }

    #[test]
    fn set_width_rejects_before_mutating() {
        let mut store = filled(4);
        let before = store.clone();
        assert!(store.set_width(-5).is_err());
        assert_eq!(store, before);
    }

    #[test]
    fn shrink_discards_and_grow_appends_empty() {
        let mut store = filled(9);
        store.set_width(3).unwrap();
        assert_eq!(store.column_count(), 4);
        assert!(store.iter().all(|o| o.x() <= 3));

        store.set_width(6).unwrap();
        assert_eq!(store.column_count(), 7);
        for x in 4..7 {
            assert!(store.column(x).unwrap().is_empty());
        }
    }

    #[test]
    fn add_appends_to_end_of_column() {
        let mut store = ColumnStore::new(5).unwrap();
        store.add_object(LevelObject::solid_block(3, 0)).unwrap();
        store.add_object(LevelObject::spike(3, 1)).unwrap();
        let trigger = LevelObject::ColorTrigger {
            pos: GridPos::new(3, 5),
            channel: 0,
            color: 0x112233,
            duration: 10,
        };
        store.add_object(trigger.clone()).unwrap();

        let column = store.column(3).unwrap();
        assert_eq!(column.len(), 3);
        assert_eq!(column[0], LevelObject::solid_block(3, 0));
        assert_eq!(column[1], LevelObject::spike(3, 1));
        assert_eq!(column[2], trigger);
    }

    #[test]
    fn add_out_of_range_fails() {
        let mut store = ColumnStore::new(2).unwrap();
        assert!(matches!(
            store.add_object(LevelObject::solid_block(3, 0)),
            Err(LevelError::ColumnOutOfRange { x: 3, columns: 3 })
        ));
        assert!(matches!(
            store.add_object(LevelObject::solid_block(-1, 0)),
            Err(LevelError::ColumnOutOfRange { x: -1, .. })
        ));
        assert_eq!(store.object_count(), 0);
    }

    #[test]
    fn objects_at_zero_and_one_match() {
        let store = filled(6);
        assert_eq!(store.objects_at(0), store.objects_at(1));
        assert_eq!(store.objects_at(-40), store.objects_at(1));
        assert_eq!(xs(&store.objects_at(1)), vec![0, 0, 1]);
    }

    #[test]
    fn objects_at_returns_left_then_own_column() {
        let store = filled(6);
        assert_eq!(xs(&store.objects_at(5)), vec![4, 4, 5]);
        assert_eq!(xs(&store.objects_at(6)), vec![5, 6, 6]);
        // Past the end only the existing left column remains.
        assert_eq!(xs(&store.objects_at(7)), vec![6, 6]);
        assert!(store.objects_at(50).is_empty());
    }

    #[test]
    fn objects_in_is_half_open_window() {
        let store = filled(20);
        let got = store.objects_in(5, 3);
        assert!(got.iter().all(|o| (4..8).contains(&o.x())));
        assert_eq!(xs(&got), vec![4, 4, 5, 6, 6, 7]);
    }

    #[test]
    fn objects_in_filters_misplaced_objects() {
        // A decoded file may park an object in a neighbouring column.
        let mut columns = vec![Vec::new(); 10];
        columns[3].push(LevelObject::solid_block(4, 0));
        columns[8].push(LevelObject::solid_block(7, 0));
        columns[8].push(LevelObject::solid_block(8, 0));
        let store = ColumnStore::from_columns(columns);

        assert_eq!(xs(&store.objects_in(5, 3)), vec![4, 7]);
        assert_eq!(store.misplaced(), 2);
    }

    #[test]
    fn objects_in_clips_at_store_edges() {
        let store = filled(3);
        assert_eq!(xs(&store.objects_in(0, 2)), vec![0, 0, 1]);
        assert_eq!(xs(&store.objects_in(3, 10)), vec![2, 2, 3]);
        assert!(store.objects_in(i32::MIN, 0).is_empty());
        assert!(store.objects_in(i32::MAX, i32::MAX).is_empty());
    }

    #[test]
    fn counts_by_kind() {
        let store = filled(4);
        assert_eq!(store.object_count(), 8);
        assert_eq!(store.count_of(ObjectKind::SolidBlock), 5);
        assert_eq!(store.count_of(ObjectKind::Spike), 3);
        assert_eq!(store.count_of(ObjectKind::ColorTrigger), 0);
    }
}
