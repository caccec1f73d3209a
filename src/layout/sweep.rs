/// One item of a 1D placement problem: a center coordinate, an extent along
/// the sweep axis and a tie-break key.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct SweepItem {
    pub id: String,
    pub pos: f32,
    pub extent: f32,
    pub order: usize,
}

impl SweepItem {
    pub(super) fn new(id: impl Into<String>, pos: f32, extent: f32, order: usize) -> Self {
        Self {
            id: id.into(),
            pos,
            extent,
            order,
        }
    }
}

pub(super) fn sort_items(items: &mut [SweepItem]) {
    items.sort_by(|a, b| a.pos.total_cmp(&b.pos).then(a.order.cmp(&b.order)));
}

/// Minimum center distance between two neighbours.
pub(super) fn min_distance(prev: &SweepItem, next: &SweepItem, gap: f32) -> f32 {
    (prev.extent + next.extent) / 2.0 + gap
}

/// Greedy left-to-right overlap resolution: items are sorted by their ideal
/// position and each one is pushed to exactly the boundary of its predecessor
/// when it would overlap. Already placed items never move back.
pub(super) fn resolve_overlaps(items: &mut [SweepItem], gap: f32) {
    sort_items(items);
    push_apart(items, gap);
}

/// Push-apart pass over items already in order.
pub(super) fn push_apart(items: &mut [SweepItem], gap: f32) {
    for idx in 1..items.len() {
        let boundary = items[idx - 1].pos + min_distance(&items[idx - 1], &items[idx], gap);
        if items[idx].pos < boundary {
            items[idx].pos = boundary;
        }
    }
}

/// Right-to-left mirror of [`push_apart`].
pub(super) fn push_apart_reverse(items: &mut [SweepItem], gap: f32) {
    for idx in (0..items.len().saturating_sub(1)).rev() {
        let boundary = items[idx + 1].pos - min_distance(&items[idx], &items[idx + 1], gap);
        if items[idx].pos > boundary {
            items[idx].pos = boundary;
        }
    }
}

/// Keeps items inside `[low, high]` where possible. The final pass is always a
/// forward push-apart, so the spacing invariant holds even when the bounds
/// are too narrow to fit the row.
pub(super) fn clamp_within(items: &mut [SweepItem], gap: f32, low: f32, high: f32) {
    if items.is_empty() || (low.is_infinite() && high.is_infinite()) {
        return;
    }
    for item in items.iter_mut() {
        item.pos = item.pos.max(low).min(high.max(low));
    }
    sort_items(items);
    push_apart(items, gap);

    let last = items.len() - 1;
    if high.is_finite() && items[last].pos > high {
        items[last].pos = high;
        push_apart_reverse(items, gap);
    }
    if low.is_finite() && items[0].pos < low {
        items[0].pos = low;
        push_apart(items, gap);
    }
}

#[cfg(test)]
pub(super) fn is_spaced(items: &[SweepItem], gap: f32) -> bool {
    items.windows(2).all(|pair| {
        pair[1].pos + 1e-3 >= pair[0].pos + min_distance(&pair[0], &pair[1], gap)
    })
}
