//! Attractor/queue manager (§4.7, component G).
//!
//! The teacher has no notion of a service queue; this is grounded on the
//! general FIFO-by-id idiom used throughout the pack's order-processing code
//! (`VecDeque<u32>` of stable ids, never indices that could shift), combined
//! with the teacher's "serving slots are a plain counter" pattern from its
//! resource-pool bookkeeping.

use std::collections::VecDeque;

use crate::layout::Attractor;
use crate::rng::SimRng;

/// Per-attractor runtime state, one entry per [`crate::layout::Attractor`] in
/// the active layout, same index.
#[derive(Debug, Clone, Default)]
pub struct QueueState {
    queue: VecDeque<u32>,
    serving: u32,
}

impl QueueState {
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn serving(&self) -> u32 {
        self.serving
    }

    pub fn contains(&self, agent_id: u32) -> bool {
        self.queue.contains(&agent_id)
    }
}

pub struct QueueManager {
    states: Vec<QueueState>,
}

impl QueueManager {
    pub fn new(attractor_count: usize) -> Self {
        Self {
            states: vec![QueueState::default(); attractor_count],
        }
    }

    pub fn reset(&mut self, attractor_count: usize) {
        self.states = vec![QueueState::default(); attractor_count];
    }

    pub fn state(&self, attractor_index: usize) -> &QueueState {
        &self.states[attractor_index]
    }

    /// `true` iff enqueuing would push `queue.len + serving` to or past
    /// `capacity`, per §4.6's attractor-selection skip rule.
    pub fn is_full(&self, attractor_index: usize, capacity: u32) -> bool {
        let s = &self.states[attractor_index];
        (s.queue.len() as u32) + s.serving >= capacity
    }

    pub fn enqueue(&mut self, attractor_index: usize, agent_id: u32) {
        self.states[attractor_index].queue.push_back(agent_id);
    }

    /// Removes `agent_id` from its queue, wherever it sits (evacuation
    /// pre-empts normal FIFO order, per §4.6's "leave queue if present").
    pub fn remove(&mut self, attractor_index: usize, agent_id: u32) {
        self.states[attractor_index].queue.retain(|&id| id != agent_id);
    }

    /// Pulls the head off the queue once a server slot is free, returning the
    /// dequeued agent id. Caller is responsible for moving that agent to
    /// `at_attractor` and setting its `at_until`.
    pub fn try_serve_next(&mut self, attractor_index: usize) -> Option<u32> {
        let state = &mut self.states[attractor_index];
        if state.serving >= 1 {
            return None;
        }
        let next = state.queue.pop_front()?;
        state.serving += 1;
        Some(next)
    }

    /// Called when an `at_attractor` agent's service period ends.
    pub fn leave_service(&mut self, attractor_index: usize) {
        let state = &mut self.states[attractor_index];
        state.serving = state.serving.saturating_sub(1);
    }

    /// Increments the serving counter without going through the FIFO, for
    /// attractors where queueing is disabled (agents go straight to
    /// `at_attractor`, §4.6) but the capacity bookkeeping still applies.
    pub fn enter_service_directly(&mut self, attractor_index: usize) {
        self.states[attractor_index].serving += 1;
    }
}

/// Weighted random draw over attractors with non-zero weight, skipping any
/// whose queue is enabled and full, per §4.6's attractor-selection rule.
/// Returns `None` (agent heads straight to an exit) if every candidate is
/// exhausted.
pub fn select_attractor(attractors: &[Attractor], queues: &QueueManager, rng: &mut SimRng) -> Option<usize> {
    let mut candidates: Vec<usize> = (0..attractors.len()).filter(|&i| attractors[i].weight > 0.0).collect();

    while !candidates.is_empty() {
        let total_weight: f64 = candidates.iter().map(|&i| attractors[i].weight).sum();
        if total_weight <= 0.0 {
            return None;
        }
        let draw = rng.range(0.0, total_weight);
        let mut acc = 0.0;
        let mut picked_pos = 0;
        for (pos, &idx) in candidates.iter().enumerate() {
            acc += attractors[idx].weight;
            if draw <= acc {
                picked_pos = pos;
                break;
            }
        }
        let idx = candidates[picked_pos];
        let attractor = &attractors[idx];
        if attractor.queueing && queues.is_full(idx, attractor.queue_capacity) {
            candidates.remove(picked_pos);
            continue;
        }
        return Some(idx);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_fifo_order_one_at_a_time() {
        let mut q = QueueManager::new(1);
        q.enqueue(0, 10);
        q.enqueue(0, 11);
        assert_eq!(q.try_serve_next(0), Some(10));
        assert_eq!(q.try_serve_next(0), None); // already serving one
        q.leave_service(0);
        assert_eq!(q.try_serve_next(0), Some(11));
    }

    #[test]
    fn is_full_counts_queue_and_serving_together() {
        let mut q = QueueManager::new(1);
        q.enqueue(0, 1);
        q.try_serve_next(0);
        q.enqueue(0, 2);
        assert!(q.is_full(0, 2));
        assert!(!q.is_full(0, 3));
    }

    #[test]
    fn remove_drops_agent_regardless_of_position() {
        let mut q = QueueManager::new(1);
        q.enqueue(0, 1);
        q.enqueue(0, 2);
        q.enqueue(0, 3);
        q.remove(0, 2);
        assert_eq!(q.state(0).len(), 2);
        assert!(!q.state(0).contains(2));
    }

    fn attractor(id: &str, weight: f64, queueing: bool, capacity: u32) -> Attractor {
        Attractor {
            id: id.into(),
            label: id.into(),
            center: crate::geometry::Vec2::ZERO,
            radius: 1.0,
            weight,
            service_time_secs: 10.0,
            queueing,
            queue_capacity: capacity,
        }
    }

    #[test]
    fn select_attractor_skips_zero_weight_and_full_queues() {
        let attractors = vec![
            attractor("a", 0.0, false, 10),
            attractor("b", 1.0, true, 1),
            attractor("c", 1.0, false, 10),
        ];
        let mut queues = QueueManager::new(attractors.len());
        queues.enqueue(1, 99);
        queues.try_serve_next(1); // attractor b is now full (serving=1, capacity=1)

        let mut rng = SimRng::from_seed(1);
        for _ in 0..20 {
            let picked = select_attractor(&attractors, &queues, &mut rng);
            assert_eq!(picked, Some(2));
        }
    }

    #[test]
    fn select_attractor_returns_none_when_all_excluded() {
        let attractors = vec![attractor("a", 0.0, false, 10)];
        let queues = QueueManager::new(1);
        let mut rng = SimRng::from_seed(2);
        assert_eq!(select_attractor(&attractors, &queues, &mut rng), None);
    }
}
