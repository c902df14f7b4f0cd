//! Phase arithmetic and phase correction for Partials.
//!
//! A synthesized Partial integrates phase from its (linearly ramped)
//! frequency, so after any edit that moves Breakpoint times or frequencies
//! the stored phases and the rendered phases drift apart. The functions here
//! bring them back together, either by recomputing stored phases from the
//! frequencies (`fix_phase_*`) or by nudging frequencies so the rendered
//! phase reaches the stored one (`fix_phase_between`, [`fix_frequency`]).
//!
//! Phase travel between two Breakpoints separated by `dt` seconds is
//! `2π · dt · (f0 + f1) / 2`, the integral of a linear frequency ramp.

use crate::breakpoint::Breakpoint;
use crate::partial::Partial;
use core::f64::consts::PI;

/// 2π.
pub const TWO_PI: f64 = 2.0 * PI;

/// Default damping applied by [`fix_frequency`] when matching phases.
pub const DEFAULT_PHASE_DAMPING: f64 = 0.5;

/// Default maximum frequency correction, in percent.
pub const DEFAULT_MAX_FIX_PERCENT: f64 = 0.2;

/// Wrap a phase to (−π, π].
#[inline]
pub fn wrap_pi(x: f64) -> f64 {
    let x = x % TWO_PI;
    if x > PI {
        x - TWO_PI
    } else if x < -PI {
        x + TWO_PI
    } else {
        x
    }
}

/// Wrap a phase to [0, 2π).
#[inline]
pub fn wrap_two_pi(x: f64) -> f64 {
    let x = x % TWO_PI;
    if x < 0.0 {
        let wrapped = x + TWO_PI;
        // -tiny + 2π can round up to exactly 2π
        if wrapped >= TWO_PI { 0.0 } else { wrapped }
    } else {
        x
    }
}

/// Phase travelled by an oscillator ramping linearly from `bp0`'s to `bp1`'s
/// frequency over `dt` seconds.
#[inline]
pub fn phase_travel(bp0: &Breakpoint, bp1: &Breakpoint, dt: f64) -> f64 {
    let favg = 0.5 * (bp0.frequency() + bp1.frequency());
    TWO_PI * favg * dt
}

fn travel_between(p: &Partial, lo: usize, hi: usize) -> f64 {
    let (t0, bp0) = p.entries()[lo];
    let (t1, bp1) = p.entries()[hi];
    phase_travel(&bp0, &bp1, t1 - t0)
}

/// Recompute phases backwards from the Breakpoint nearest `t`.
///
/// Walks toward the start, setting each earlier phase from its successor,
/// and stops after recomputing the first null Breakpoint encountered. Any
/// Breakpoints before that null are then fixed forward from the start.
pub fn fix_phase_before(p: &mut Partial, t: f64) {
    if p.len() < 2 {
        return;
    }
    let Some(mut pos) = p.find_nearest(t) else {
        return;
    };

    while pos != 0 && !p.entries()[pos].1.is_null() {
        let fwd = pos;
        pos -= 1;
        let travel = travel_between(p, pos, fwd);
        let phase = wrap_pi(p.entries()[fwd].1.phase() - travel);
        p.entries_mut()[pos].1.set_phase(phase);
    }

    if pos != 0 {
        let stop = p.entries()[pos - 1].0;
        let start = p.start_time();
        fix_phase_forward(p, start, stop);
    }
}

/// Recompute phases forward from the Breakpoint nearest `t` to the end.
pub fn fix_phase_after(p: &mut Partial, t: f64) {
    let end = p.end_time();
    fix_phase_forward(p, t, end);
}

/// Recompute phases forward over `[tbeg, tend]`.
///
/// Starting at the Breakpoint nearest `tbeg`, each non-null Breakpoint up to
/// the last one before `tend` gets the phase of its predecessor plus the
/// travel between them. Null Breakpoints keep their phase, so onsets are
/// preserved.
pub fn fix_phase_forward(p: &mut Partial, tbeg: f64, tend: f64) {
    let (tbeg, tend) = if tbeg > tend { (tend, tbeg) } else { (tbeg, tend) };
    if p.len() < 2 {
        return;
    }
    let Some(mut pos) = p.find_nearest(tbeg) else {
        return;
    };
    let mut stop = p.find_after(tend);
    if pos != stop && stop > 0 {
        stop -= 1;
    }

    while pos < stop {
        let prev = pos;
        pos += 1;
        if !p.entries()[pos].1.is_null() {
            let travel = travel_between(p, prev, pos);
            let phase = wrap_pi(p.entries()[prev].1.phase() + travel);
            p.entries_mut()[pos].1.set_phase(phase);
        }
    }
}

/// Recompute phases on both sides of the Breakpoint nearest `t`, which keeps
/// its own phase.
pub fn fix_phase_at(p: &mut Partial, t: f64) {
    if p.len() > 1 {
        fix_phase_before(p, t);
        fix_phase_after(p, t);
    }
}

/// Adjust frequencies between the Breakpoints nearest `tbeg` and `tend` so
/// that phase integrated from the first reaches the stored phase of the last.
///
/// The correction is a constant frequency offset applied to every interior
/// Breakpoint; interior phases are recomputed from the new frequencies. If
/// the range extends past either end of the Partial, this reduces to
/// [`fix_phase_after`] or [`fix_phase_before`]. Ranges with no interior
/// Breakpoint are left untouched.
pub fn fix_phase_between(p: &mut Partial, tbeg: f64, tend: f64) {
    let (tbeg, tend) = if tbeg > tend { (tend, tbeg) } else { (tbeg, tend) };
    if p.is_empty() {
        return;
    }

    if p.end_time() < tend {
        fix_phase_after(p, tbeg);
        return;
    }
    if p.start_time() > tbeg {
        fix_phase_before(p, tend);
        return;
    }

    let (Some(b), Some(e)) = (p.find_nearest(tbeg), p.find_nearest(tend)) else {
        return;
    };
    if e < b + 2 {
        #[cfg(feature = "tracing")]
        tracing::trace!(tbeg, tend, "no interior breakpoints, phase left as is");
        return;
    }

    let travel: f64 = (b..e).map(|i| travel_between(p, i, i + 1)).sum();
    let deviation = wrap_pi(p.entries()[e].1.phase() - (p.entries()[b].1.phase() + travel));
    let desired = travel + deviation;

    let t0 = p.entries()[b].0;
    let t1 = p.entries()[b + 1].0;
    let tn = p.entries()[e].0;
    let tn1 = p.entries()[e - 1].0;
    let delta = (2.0 * (desired - travel) / (tn + tn1 - t1 - t0)) / TWO_PI;

    for i in (b + 1)..e {
        let f = p.entries()[i].1.frequency();
        p.entries_mut()[i].1.set_frequency(f + delta);
        let new_travel = travel_between(p, i - 1, i);
        let phase = wrap_pi(p.entries()[i - 1].1.phase() + new_travel);
        p.entries_mut()[i].1.set_phase(phase);
    }
}

/// Nudge `bp1`'s frequency so the phase travelled from `bp0` over `dt`
/// lands closer to `bp1`'s stored phase, then store the phase actually
/// reached.
///
/// `damping` scales how much of the phase error is corrected;
/// `max_fix_percent` bounds the frequency change (in percent) for non-null
/// Breakpoints. Null Breakpoints are corrected without bound.
pub fn match_phase_forward(
    bp0: &Breakpoint,
    bp1: &mut Breakpoint,
    dt: f64,
    damping: f64,
    max_fix_percent: f64,
) {
    let mut travel = phase_travel(bp0, bp1, dt);
    let err = wrap_pi(bp1.phase() - (bp0.phase() + travel));
    travel += damping * err;

    let mut ftgt = (travel / (PI * dt)) - bp0.frequency();
    if !bp1.is_null() {
        let hi = bp1.frequency() * (1.0 + max_fix_percent * 0.01);
        let lo = bp1.frequency() * (1.0 - max_fix_percent * 0.01);
        ftgt = ftgt.clamp(lo.min(hi), hi.max(lo));
    }

    bp1.set_frequency(ftgt);
    let phi = wrap_pi(bp0.phase() + phase_travel(bp0, bp1, dt));
    bp1.set_phase(phi);
}

/// Apply [`match_phase_forward`] to every consecutive Breakpoint pair,
/// with the default damping.
pub fn fix_frequency(p: &mut Partial, max_fix_percent: f64) {
    let entries = p.entries_mut();
    for i in 1..entries.len() {
        let (head, tail) = entries.split_at_mut(i);
        let (t0, ref bp0) = head[i - 1];
        let (t1, ref mut bp1) = tail[0];
        let dt = t1 - t0;
        if dt > 0.0 {
            match_phase_forward(bp0, bp1, dt, DEFAULT_PHASE_DAMPING, max_fix_percent);
        }
    }
}
