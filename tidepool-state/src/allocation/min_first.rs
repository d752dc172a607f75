//! Min-first allocator over any additive unit.

/// Quantity the allocator can distribute.
pub trait AllocationUnit: Copy + Ord {
    /// Additive identity.
    const ZERO: Self;
    /// Largest representable value, the "no bound yet" marker.
    const MAX: Self;

    /// `self + other`, saturating.
    fn add(self, other: Self) -> Self;
    /// `self - other`, saturating at zero.
    fn sub(self, other: Self) -> Self;
    /// `ceil(self / count)`.
    fn ceil_div_count(self, count: u64) -> Self;
}

impl AllocationUnit for u64 {
    const ZERO: Self = 0;
    const MAX: Self = u64::MAX;

    fn add(self, other: Self) -> Self {
        self.saturating_add(other)
    }

    fn sub(self, other: Self) -> Self {
        self.saturating_sub(other)
    }

    fn ceil_div_count(self, count: u64) -> Self {
        self.div_ceil(count)
    }
}

/// Allocate up to `allocation_size` across `buckets`, filling the lowest
/// first. Returns the total allocated.
///
/// `buckets` and `capacities` are parallel; extra entries of the longer
/// slice are ignored.
pub fn allocate<T: AllocationUnit>(buckets: &mut [T], capacities: &[T], allocation_size: T) -> T {
    let mut allocated = T::ZERO;
    while allocated < allocation_size {
        let step = allocate_to_best_candidate(buckets, capacities, allocation_size.sub(allocated));
        if step == T::ZERO {
            break;
        }
        allocated = allocated.add(step);
    }
    allocated
}

/// One allocation step into the least-filled bucket below capacity.
///
/// With `n` buckets tied at the minimum, the step is `ceil(size / n)` so
/// the tied buckets rise together over successive steps. A step never
/// lifts the bucket past the next fill level above it or its own capacity.
pub fn allocate_to_best_candidate<T: AllocationUnit>(
    buckets: &mut [T],
    capacities: &[T],
    allocation_size: T,
) -> T {
    if allocation_size == T::ZERO {
        return T::ZERO;
    }

    let mut best_index: Option<usize> = None;
    let mut best_fill = T::MAX;
    let mut best_count: u64 = 0;

    for (i, (fill, cap)) in buckets.iter().zip(capacities).enumerate() {
        if fill >= cap {
            continue;
        }
        if *fill < best_fill {
            best_index = Some(i);
            best_fill = *fill;
            best_count = 1;
        } else if *fill == best_fill {
            best_count += 1;
        }
    }

    let Some(best_index) = best_index else {
        return T::ZERO;
    };

    let mut upper_bound = T::MAX;
    for (fill, cap) in buckets.iter().zip(capacities) {
        if fill >= cap {
            continue;
        }
        if *fill > best_fill && *fill < upper_bound {
            upper_bound = *fill;
        }
    }

    let share = if best_count > 1 {
        allocation_size.ceil_div_count(best_count)
    } else {
        allocation_size
    };
    let room = upper_bound.min(capacities[best_index]).sub(best_fill);
    let allocated = share.min(room);

    buckets[best_index] = buckets[best_index].add(allocated);
    allocated
}
