//! Combined attack resolution
//!
//! Every friendly unit that can reach a target forms one attack group
//! with up to two options (primary, secondary). A resolution picks at most
//! one option per group. Reachable attack sums are tracked with boolean
//! tables over `[0, M]`, where `M` is the target's primary height and sums
//! are clamped at `M`.

use crate::action::Part;
use crate::board::{Board, Cid};
use crate::reach::reachable_for_attack;
use crate::unit::{normalize, satisfies_sp, Color, Unit, MAX_HEIGHT};

/// Reachable sums, indexed 0..=M
type Sums = [bool; MAX_HEIGHT as usize + 1];

/// One sub-unit able to hit the target
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttackOption {
    pub part: Part,
    pub height: u8,
}

/// All options of one attacking unit
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttackGroup {
    pub origin: Cid,
    pub unit: Unit,
    pub options: Vec<AttackOption>,
}

/// What the side to move can do to one enemy cell
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttackAnalysis {
    pub groups: Vec<AttackGroup>,
    /// Attackers of an enemy tribun; non-empty only for tribun targets
    pub tribun_attackers: Vec<Cid>,
    pub can_kill: bool,
    /// Options whose height closes the gap left by all other groups
    pub killers: Vec<(Cid, Part)>,
    pub enslavers: Vec<Cid>,
    pub can_liberate: bool,
    /// Distinct effective damage amounts, ascending
    pub damages: Vec<u8>,
}

impl AttackAnalysis {
    pub fn can_kill_with(&self, attacker: Cid, part: Part) -> bool {
        self.killers.contains(&(attacker, part))
    }

    pub fn can_damage(&self, amount: u8) -> bool {
        self.damages.contains(&amount)
    }
}

/// Units of `attacker` that can reach `target`, in cell order
pub fn collect_groups(board: &Board, target: Cid, attacker: Color) -> Vec<AttackGroup> {
    let mut groups = Vec::new();
    for (origin, unit) in board.units() {
        if unit.color != attacker {
            continue;
        }

        let mut options = Vec::new();
        for part in Part::BOTH {
            let height = unit.height(part);
            if height == 0 {
                continue;
            }
            let tribun = unit.tribun && part == Part::Primary;
            if reachable_for_attack(origin, height, attacker, tribun, board).contains(&target) {
                options.push(AttackOption { part, height });
            }
        }

        if !options.is_empty() {
            groups.push(AttackGroup { origin, unit, options });
        }
    }
    groups
}

/// Analyze `target` from the point of view of `attacker`. Returns `None`
/// if the target cell is empty or holds one of `attacker`'s own units.
pub fn analyze_target(board: &Board, target: Cid, attacker: Color) -> Option<AttackAnalysis> {
    let victim = board.get(target)?;
    if victim.color == attacker {
        return None;
    }

    let groups = collect_groups(board, target, attacker);

    if victim.tribun {
        let tribun_attackers = groups.iter().map(|g| g.origin).collect();
        return Some(AttackAnalysis {
            groups,
            tribun_attackers,
            ..Default::default()
        });
    }

    let m = victim.primary;
    let n = groups.len();

    let mut prefix: Vec<Sums> = Vec::with_capacity(n + 1);
    prefix.push(zero_sum());
    for group in &groups {
        let last = prefix[prefix.len() - 1];
        prefix.push(add_group(&last, group, m));
    }

    let mut suffix: Vec<Sums> = vec![zero_sum(); n + 1];
    for i in (0..n).rev() {
        suffix[i] = add_group(&suffix[i + 1], &groups[i], m);
    }

    let mut killers = Vec::new();
    let mut enslavers = Vec::new();
    for (i, group) in groups.iter().enumerate() {
        let others = convolve(&prefix[i], &suffix[i + 1], m);
        for option in &group.options {
            let needed = m.saturating_sub(option.height);
            if !(needed..=m).any(|s| others[usize::from(s)]) {
                continue;
            }
            killers.push((group.origin, option.part));
            if option.part == Part::Primary && can_enslave(&group.unit, &victim) {
                enslavers.push(group.origin);
            }
        }
    }

    let all = prefix[n];
    let mut can_liberate = false;
    let mut damages = Vec::new();
    for s in 1..m {
        if !all[usize::from(s)] {
            continue;
        }
        let hit = Unit {
            primary: m - s,
            ..victim
        };
        match normalize(hit) {
            Some(after) if after.color != victim.color => can_liberate = true,
            Some(after) => damages.push(m - after.primary),
            None => {}
        }
    }
    damages.sort_unstable();
    damages.dedup();

    Some(AttackAnalysis {
        groups,
        tribun_attackers: Vec::new(),
        can_kill: all[usize::from(m)],
        killers,
        enslavers,
        can_liberate,
        damages,
    })
}

fn can_enslave(master: &Unit, victim: &Unit) -> bool {
    !master.tribun
        && !master.has_secondary()
        && !victim.tribun
        && !victim.has_secondary()
        && satisfies_sp(master.primary, victim.primary)
}

fn zero_sum() -> Sums {
    let mut sums = [false; MAX_HEIGHT as usize + 1];
    sums[0] = true;
    sums
}

/// Extend `sums` by at most one option of `group`
fn add_group(sums: &Sums, group: &AttackGroup, m: u8) -> Sums {
    let mut next = *sums;
    for s in 0..=m {
        if !sums[usize::from(s)] {
            continue;
        }
        for option in &group.options {
            next[usize::from(m.min(s + option.height))] = true;
        }
    }
    next
}

/// Sums reachable by combining one sum from `a` with one from `b`
fn convolve(a: &Sums, b: &Sums, m: u8) -> Sums {
    let mut out = [false; MAX_HEIGHT as usize + 1];
    for i in 0..=m {
        if !a[usize::from(i)] {
            continue;
        }
        for j in 0..=m {
            if b[usize::from(j)] {
                out[usize::from(m.min(i + j))] = true;
            }
        }
    }
    out
}
