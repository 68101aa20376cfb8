//! Turnpoint splicing.
//!
//! A trajectory is a queue of turnpoints: floors where the elevator stops
//! or reverses. Splicing inserts a directed span `[start, end]` into that
//! queue when the elevator already passes both floors in the right order,
//! so a new request can ride along without a detour.

use std::collections::VecDeque;

/// Inserts the span `[start, end]` into `points`, returning the new queue.
///
/// - `current` is the elevator's floor; a span starting there is refused.
/// - `start` is only placed after at least one existing turnpoint.
/// - In non-strict mode, when `start` fits but the queue ends before `end`,
///   `end` is appended. That is shorter than returning to `start` first.
/// - `strict` refuses any span not wholly covered by `points`.
pub fn splice(
    current: i32,
    points: &VecDeque<i32>,
    start: i32,
    end: i32,
    strict: bool,
) -> Option<VecDeque<i32>> {
    if start < end {
        splice_with(current, points, start, end, strict, |x, y, z| x <= y && y <= z)
    } else {
        splice_with(current, points, start, end, strict, |x, y, z| x >= y && y >= z)
    }
}

fn splice_with(
    current: i32,
    points: &VecDeque<i32>,
    start: i32,
    end: i32,
    strict: bool,
    is_monotonic: impl Fn(i32, i32, i32) -> bool,
) -> Option<VecDeque<i32>> {
    // Picking up on the current floor races with the elevator leaving it
    if current == start {
        return None;
    }

    let mut it = points.iter().copied();
    let mut right = it.next()?;
    let mut left = current;
    let mut result = VecDeque::with_capacity(points.len() + 2);

    loop {
        if is_monotonic(left, start, right) && !result.is_empty() {
            if start != left && start != right {
                result.push_back(start);
            }
            break;
        }

        let next = it.next()?;
        result.push_back(right);
        left = right;
        right = next;
    }

    loop {
        if is_monotonic(left, end, right) {
            if end != left && end != right {
                result.push_back(end);
            }
            break;
        }

        let Some(next) = it.next() else {
            if strict {
                return None;
            }
            result.push_back(right);
            result.push_back(end);
            return Some(result);
        };

        result.push_back(right);
        left = right;
        right = next;
    }

    result.push_back(right);
    result.extend(it);
    Some(result)
}
