use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};
use crate::geometry::{BoundaryType, Geometry};

use super::{AzimLayout, Track, TrackLink};

/// Cycle bookkeeping of one azimuthal angle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleStats {
    /// Tracks visited before returning to the start, `0` for open chains.
    pub tracks_per_cycle: usize,
    /// Distinct cycles through the tracks of this angle.
    pub cycles_per_azim: usize,
    /// Path length of one cycle.
    pub cycle_length: f64,
}

/// Sets boundary conditions on both ends of every track and links each end
/// to the track it continues into.
///
/// Reflective ends continue into the mirror angle, periodic ends into the
/// same angle on the opposite side, vacuum ends nowhere.
pub(crate) fn link_tracks(tracks: &mut [Vec<Track>], layouts: &[AzimLayout], geometry: &Geometry) {
    let half = layouts.len();
    for (a, angle) in tracks.iter_mut().enumerate() {
        let (nx, ny) = (layouts[a].num_x, layouts[a].num_y);
        let mirror = half - a - 1;
        for track in angle.iter_mut() {
            let i = track.index;
            track.bc_start = geometry.boundary_type(track.start_side);
            track.bc_end = geometry.boundary_type(track.end_side);

            track.next_fwd = match track.bc_end {
                BoundaryType::Reflective if i < ny => Some(link(mirror, nx + i, true)),
                BoundaryType::Reflective => Some(link(mirror, nx + 2 * ny - 1 - i, false)),
                BoundaryType::Periodic if i < ny => Some(link(a, nx + i, true)),
                BoundaryType::Periodic => Some(link(a, i - ny, true)),
                BoundaryType::Vacuum | BoundaryType::None => None,
            };
            track.next_bwd = match track.bc_start {
                BoundaryType::Reflective if i < nx => Some(link(mirror, nx - 1 - i, true)),
                BoundaryType::Reflective => Some(link(mirror, i - nx, false)),
                BoundaryType::Periodic if i < nx => Some(link(a, i + ny, false)),
                BoundaryType::Periodic => Some(link(a, i - nx, false)),
                BoundaryType::Vacuum | BoundaryType::None => None,
            };
        }
    }
}

fn link(azim: usize, track: usize, forward: bool) -> TrackLink {
    TrackLink { azim, track, forward }
}

/// Follows the cycles through the tracks of every angle.
///
/// # Errors
///
/// Returns [`TrackError::CycleNotClosed`] if a chain neither ends nor
/// returns to its first track within twice the total track count.
pub(crate) fn cycle_stats(tracks: &[Vec<Track>]) -> Result<Vec<CycleStats>> {
    let bound = hop_bound(tracks);
    let mut stats = Vec::with_capacity(tracks.len());

    for (a, angle) in tracks.iter().enumerate() {
        let mut visited: Vec<Vec<bool>> = tracks.iter().map(|t| vec![false; t.len()]).collect();
        let mut entry = CycleStats::default();

        for i in 0..angle.len() {
            if visited[a][i] {
                continue;
            }
            let Some(train) = follow_train(tracks, link(a, i, true), bound)? else {
                // One open chain means no track of this angle closes.
                entry = CycleStats::default();
                break;
            };
            for l in &train {
                visited[l.azim][l.track] = true;
            }
            if entry.cycles_per_azim == 0 {
                entry.tracks_per_cycle = train.len();
                entry.cycle_length = train.iter().map(|l| tracks[l.azim][l.track].length()).sum();
            }
            entry.cycles_per_azim += 1;
        }
        stats.push(entry);
    }
    Ok(stats)
}

/// Tracks of every cycle in traversal order, indexed by angle, then by
/// cycle through that angle, then by position along the cycle.
///
/// A cycle starts at its lowest-index track of the angle, traversed
/// forward. Angles whose chains leave the domain get no trains.
///
/// # Errors
///
/// Returns [`TrackError::CycleNotClosed`] under the same bound as
/// [`cycle_stats`].
pub(crate) fn cycle_trains(tracks: &[Vec<Track>]) -> Result<Vec<Vec<Vec<TrackLink>>>> {
    let bound = hop_bound(tracks);
    let mut trains = Vec::with_capacity(tracks.len());
    for (a, angle) in tracks.iter().enumerate() {
        let mut seen = HashSet::new();
        let mut angle_trains = Vec::new();
        for track in angle {
            if !seen.insert(track.cycle_id) {
                continue;
            }
            match follow_train(tracks, link(a, track.index, true), bound)? {
                Some(train) => angle_trains.push(train),
                None => {
                    angle_trains.clear();
                    break;
                }
            }
        }
        trains.push(angle_trains);
    }
    Ok(trains)
}

fn hop_bound(tracks: &[Vec<Track>]) -> usize {
    2 * tracks.iter().map(Vec::len).sum::<usize>() + 1
}

/// Walks forward from `start`, returning the visited links on closure, or
/// `None` if the chain leaves the domain.
fn follow_train(
    tracks: &[Vec<Track>],
    start: TrackLink,
    bound: usize,
) -> Result<Option<Vec<TrackLink>>> {
    let mut train = vec![start];
    let mut current = start;
    loop {
        let Some(next) = tracks[current.azim][current.track].next(current.forward) else {
            return Ok(None);
        };
        if next == start {
            return Ok(Some(train));
        }
        if train.len() >= bound {
            return Err(TrackError::CycleNotClosed {
                azim: start.azim,
                track: start.track,
                bound,
            }
            .into());
        }
        train.push(next);
        current = next;
    }
}

/// Labels connected groups of linked tracks, returning the group count.
pub(crate) fn assign_cycle_ids(tracks: &mut [Vec<Track>]) -> usize {
    let (ids, count) = label_groups(tracks, |_| true);
    for (angle, ids) in tracks.iter_mut().zip(ids) {
        for (track, id) in angle.iter_mut().zip(ids) {
            track.cycle_id = id;
        }
    }
    count
}

/// Labels the groups joined by periodic links alone and by reflective
/// links alone. Returns the periodic and reflective group counts.
pub(crate) fn assign_boundary_cycle_ids(tracks: &mut [Vec<Track>]) -> (usize, usize) {
    let (periodic, num_periodic) = label_groups(tracks, |bc| bc == BoundaryType::Periodic);
    let (reflective, num_reflective) = label_groups(tracks, |bc| bc == BoundaryType::Reflective);
    for ((angle, periodic), reflective) in tracks.iter_mut().zip(periodic).zip(reflective) {
        for ((track, p), r) in angle.iter_mut().zip(periodic).zip(reflective) {
            track.periodic_cycle_id = p;
            track.reflective_cycle_id = r;
        }
    }
    (num_periodic, num_reflective)
}

/// Breadth-first labelling over the links whose end condition `follows`
/// accepts. Every track gets a label; isolated tracks get their own.
fn label_groups<F>(tracks: &[Vec<Track>], follows: F) -> (Vec<Vec<usize>>, usize)
where
    F: Fn(BoundaryType) -> bool,
{
    let mut assigned: Vec<Vec<Option<usize>>> =
        tracks.iter().map(|t| vec![None; t.len()]).collect();
    let mut next_id = 0;
    for a in 0..tracks.len() {
        for i in 0..tracks[a].len() {
            if assigned[a][i].is_some() {
                continue;
            }
            assigned[a][i] = Some(next_id);
            let mut queue = VecDeque::from([(a, i)]);
            while let Some((qa, qi)) = queue.pop_front() {
                let track = &tracks[qa][qi];
                let ends = [(track.next_fwd, track.bc_end), (track.next_bwd, track.bc_start)];
                for next in ends.into_iter().filter_map(|(next, bc)| next.filter(|_| follows(bc))) {
                    let slot = &mut assigned[next.azim][next.track];
                    if slot.is_none() {
                        *slot = Some(next_id);
                        queue.push_back((next.azim, next.track));
                    }
                }
            }
            next_id += 1;
        }
    }

    let ids = assigned
        .into_iter()
        .map(|angle| angle.into_iter().map(Option::unwrap_or_default).collect())
        .collect();
    (ids, next_id)
}

/// Numbers the tracks along each chain of periodic links.
///
/// A chain starts at a track whose start is not periodic. Chains that
/// close on themselves start at their lowest-index track.
pub(crate) fn assign_periodic_indices(tracks: &mut [Vec<Track>]) {
    for angle in tracks.iter_mut() {
        let mut assigned = vec![false; angle.len()];
        let heads: Vec<usize> = (0..angle.len())
            .filter(|&i| angle[i].bc_start != BoundaryType::Periodic)
            .chain(0..angle.len())
            .collect();
        for head in heads {
            if assigned[head] {
                continue;
            }
            let mut current = head;
            let mut index = 0;
            loop {
                assigned[current] = true;
                angle[current].periodic_index = index;
                index += 1;
                let track = &angle[current];
                if track.bc_end != BoundaryType::Periodic {
                    break;
                }
                match track.next_fwd {
                    Some(next) if !assigned[next.track] => current = next.track,
                    _ => break,
                }
            }
        }
    }
}

/// Sorts tracks into parallel groups and assigns uids in group order.
///
/// Without periodic boundaries there are two groups, one per azimuthal
/// quadrant. With them there are six: each quadrant split into chain heads,
/// odd and even periodic indices. Returns the sweep order as
/// `(azim, index)` pairs and the cumulative track count per group.
pub(crate) fn assign_parallel_groups(
    tracks: &mut [Vec<Track>],
    periodic: bool,
) -> (Vec<(usize, usize)>, Vec<usize>) {
    let quarter = tracks.len() / 2;
    let num_groups = if periodic { 6 } else { 2 };
    let mut members: Vec<Vec<(usize, usize)>> = vec![Vec::new(); num_groups];

    for (a, angle) in tracks.iter_mut().enumerate() {
        let quadrant = usize::from(a >= quarter);
        for track in angle.iter_mut() {
            track.parallel_group = if periodic {
                let class = match track.periodic_index {
                    0 => 0,
                    p if p % 2 == 1 => 1,
                    _ => 2,
                };
                3 * quadrant + class
            } else {
                quadrant
            };
            members[track.parallel_group].push((a, track.index));
        }
    }

    let mut order = Vec::new();
    let mut bounds = vec![0];
    for group in members {
        order.extend(group);
        bounds.push(order.len());
    }
    for (uid, &(a, i)) in order.iter().enumerate() {
        tracks[a][i].uid = uid;
    }
    (order, bounds)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::fixtures;
    use crate::quadrature::{Quadrature, QuadratureType};
    use crate::tracks::layout::{compute_layouts, lay_out_tracks};

    fn gcd(a: usize, b: usize) -> usize {
        if b == 0 {
            a
        } else {
            gcd(b, a % b)
        }
    }

    fn linked(
        geometry: &Geometry,
        num_azim: usize,
        spacing: f64,
    ) -> (Vec<AzimLayout>, Vec<Vec<Track>>) {
        let q = Quadrature::new(QuadratureType::TabuchiYamamoto, num_azim, 1).unwrap();
        let layouts = compute_layouts(&q, geometry.width_x(), geometry.width_y(), spacing);
        let mut tracks = lay_out_tracks(&layouts, geometry.width_x(), geometry.width_y());
        link_tracks(&mut tracks, &layouts, geometry);
        (layouts, tracks)
    }

    #[test]
    fn links_are_mutual() {
        for bc in [BoundaryType::Reflective, BoundaryType::Periodic] {
            let geometry = fixtures::box_geometry(2.0, 1.0, bc);
            let (_, tracks) = linked(&geometry, 8, 0.1);
            for track in tracks.iter().flatten() {
                for forward in [true, false] {
                    let next = track.next(forward).unwrap();
                    // Leaving the successor the opposite way leads back here.
                    let back = tracks[next.azim][next.track].next(!next.forward).unwrap();
                    assert_eq!(
                        (back.azim, back.track, back.forward),
                        (track.azim, track.index, !forward)
                    );
                }
            }
        }
    }

    #[test]
    fn reflective_cycle_lengths() {
        let geometry = fixtures::box_geometry(2.0, 1.0, BoundaryType::Reflective);
        let (layouts, tracks) = linked(&geometry, 16, 0.1);
        let stats = cycle_stats(&tracks).unwrap();
        for (l, s) in layouts.iter().zip(&stats) {
            let g = gcd(l.num_x, l.num_y);
            assert_eq!(s.tracks_per_cycle, 2 * (l.num_x + l.num_y) / g);
            assert_eq!(s.cycles_per_azim, g);
            assert!(s.cycle_length > 0.0);
        }
    }

    #[test]
    fn periodic_cycle_lengths() {
        let geometry = fixtures::box_geometry(1.0, 1.0, BoundaryType::Periodic);
        let (layouts, tracks) = linked(&geometry, 8, 0.1);
        let stats = cycle_stats(&tracks).unwrap();
        for (l, s) in layouts.iter().zip(&stats) {
            let g = gcd(l.num_x, l.num_y);
            assert_eq!(s.tracks_per_cycle, (l.num_x + l.num_y) / g);
            assert_eq!(s.cycles_per_azim, g);
        }
    }

    #[test]
    fn following_a_cycle_returns_to_start() {
        let geometry = fixtures::box_geometry(1.5, 1.0, BoundaryType::Reflective);
        let (_, tracks) = linked(&geometry, 8, 0.2);
        let stats = cycle_stats(&tracks).unwrap();
        for (a, angle) in tracks.iter().enumerate() {
            for i in 0..angle.len() {
                let start = link(a, i, true);
                let mut current = start;
                for _ in 0..stats[a].tracks_per_cycle {
                    current = tracks[current.azim][current.track].next(current.forward).unwrap();
                }
                assert_eq!(current, start);
            }
        }
    }

    #[test]
    fn vacuum_leaves_open_chains() {
        let geometry = fixtures::box_geometry(1.0, 1.0, BoundaryType::Vacuum);
        let (_, tracks) = linked(&geometry, 4, 0.1);
        assert!(tracks.iter().flatten().all(|t| t.next_fwd.is_none() && t.next_bwd.is_none()));
        let stats = cycle_stats(&tracks).unwrap();
        assert!(stats.iter().all(|s| s.tracks_per_cycle == 0));
    }

    #[test]
    fn cycle_ids_match_cycle_count() {
        let geometry = fixtures::box_geometry(1.0, 1.0, BoundaryType::Reflective);
        let (_, mut tracks) = linked(&geometry, 4, 0.1);
        let stats = cycle_stats(&tracks).unwrap();
        let count = assign_cycle_ids(&mut tracks);
        assert_eq!(count, stats[0].cycles_per_azim);
        let first = &tracks[0][0];
        let next = first.next_fwd.unwrap();
        assert_eq!(tracks[next.azim][next.track].cycle_id, first.cycle_id);
    }

    #[test]
    fn boundary_cycle_ids_follow_one_link_kind() {
        let reflective = fixtures::box_geometry(2.0, 1.0, BoundaryType::Reflective);
        let (_, mut tracks) = linked(&reflective, 8, 0.1);
        let total: usize = tracks.iter().map(Vec::len).sum();
        let num_cycles = assign_cycle_ids(&mut tracks);
        let (num_periodic, num_reflective) = assign_boundary_cycle_ids(&mut tracks);
        assert_eq!(num_periodic, total);
        assert_eq!(num_reflective, num_cycles);
        assert!(tracks
            .iter()
            .flatten()
            .all(|t| t.reflective_cycle_id == t.cycle_id));

        let periodic = fixtures::box_geometry(2.0, 1.0, BoundaryType::Periodic);
        let (_, mut tracks) = linked(&periodic, 8, 0.1);
        let stats = cycle_stats(&tracks).unwrap();
        let (num_periodic, num_reflective) = assign_boundary_cycle_ids(&mut tracks);
        assert_eq!(num_reflective, total);
        assert_eq!(num_periodic, stats.iter().map(|s| s.cycles_per_azim).sum::<usize>());
        for track in tracks.iter().flatten() {
            let next = track.next_fwd.unwrap();
            assert_eq!(tracks[next.azim][next.track].periodic_cycle_id, track.periodic_cycle_id);
        }
    }

    #[test]
    fn trains_chain_through_links() {
        let geometry = fixtures::box_geometry(1.5, 1.0, BoundaryType::Reflective);
        let (_, mut tracks) = linked(&geometry, 8, 0.2);
        assign_cycle_ids(&mut tracks);
        let stats = cycle_stats(&tracks).unwrap();
        let trains = cycle_trains(&tracks).unwrap();
        for (a, angle_trains) in trains.iter().enumerate() {
            assert_eq!(angle_trains.len(), stats[a].cycles_per_azim);
            for train in angle_trains {
                assert_eq!(train.len(), stats[a].tracks_per_cycle);
                assert_eq!((train[0].azim, train[0].forward), (a, true));
                for (k, l) in train.iter().enumerate() {
                    let expected = train[(k + 1) % train.len()];
                    assert_eq!(tracks[l.azim][l.track].next(l.forward), Some(expected));
                }
            }
        }

        let open = fixtures::box_geometry(1.0, 1.0, BoundaryType::Vacuum);
        let (_, tracks) = linked(&open, 4, 0.1);
        assert!(cycle_trains(&tracks).unwrap().iter().all(Vec::is_empty));
    }

    #[test]
    fn periodic_groups_partition_tracks() {
        let geometry = fixtures::box_geometry(2.0, 1.0, BoundaryType::Periodic);
        let (_, mut tracks) = linked(&geometry, 8, 0.1);
        assign_periodic_indices(&mut tracks);
        for track in tracks.iter().flatten() {
            if let Some(next) = track.next_fwd {
                let successor = &tracks[next.azim][next.track];
                if successor.periodic_index != 0 {
                    assert_eq!(successor.periodic_index, track.periodic_index + 1);
                }
            }
        }

        let total: usize = tracks.iter().map(Vec::len).sum();
        let (order, bounds) = assign_parallel_groups(&mut tracks, true);
        assert_eq!(order.len(), total);
        assert_eq!(bounds.len(), 7);
        assert_eq!(bounds[6], total);
        for (uid, &(a, i)) in order.iter().enumerate() {
            let track = &tracks[a][i];
            assert_eq!(track.uid, uid);
            assert!(bounds[track.parallel_group] <= uid && uid < bounds[track.parallel_group + 1]);
        }
    }
}
