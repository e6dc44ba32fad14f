//! Color grouping and parallel allocator construction using Rayon.

use crate::allocator::ColorAllocator;
use crate::ball::Ball;
use crate::config::OverlapMode;
use crate::error::Result;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

/// Group balls by color, keeping colors in the order they first appear.
///
/// Balls within a group keep their input order.
pub fn group_by_color(balls: Vec<Ball>) -> Vec<(String, Vec<Ball>)> {
    let mut slots: FxHashMap<String, usize> = FxHashMap::default();
    let mut groups: Vec<(String, Vec<Ball>)> = Vec::new();

    for ball in balls {
        let idx = match slots.get(&ball.color) {
            Some(&idx) => idx,
            None => {
                slots.insert(ball.color.clone(), groups.len());
                groups.push((ball.color.clone(), Vec::new()));
                groups.len() - 1
            }
        };
        groups[idx].1.push(ball);
    }

    groups
}

/// Build one allocator per color group, in group order.
///
/// Groups are built in parallel once the total ball count reaches
/// `threshold`.
pub fn build_allocators(
    groups: Vec<(String, Vec<Ball>)>,
    mode: OverlapMode,
    threshold: usize,
) -> Result<Vec<ColorAllocator>> {
    let total: usize = groups.iter().map(|(_, balls)| balls.len()).sum();

    if total >= threshold && groups.len() > 1 {
        groups
            .into_par_iter()
            .map(|(color, balls)| ColorAllocator::new(color, &balls, mode))
            .collect()
    } else {
        groups
            .into_iter()
            .map(|(color, balls)| ColorAllocator::new(color, &balls, mode))
            .collect()
    }
}
