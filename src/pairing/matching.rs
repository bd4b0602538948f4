//! Minimum-weight perfect matching on complete graphs.
//!
//! The solver is the primal-dual weighted blossom algorithm for general
//! graphs (Edmonds, with Galil's O(n^3) bookkeeping). It works on integer
//! weights so that the dual variables stay exact: real weights are scaled
//! by [`WEIGHT_RESOLUTION`] and rounded before solving.

use log::debug;
use ndarray::Array2;

use crate::errors::{PairingError, PairingResult};

/// Weights closer than this fraction are considered equal
pub const WEIGHT_RESOLUTION: f64 = 1000.0;

/// Largest scaled weight accepted, keeps every dual variable far from overflow
const MAX_SCALED_WEIGHT: f64 = 1e15;

const NONE: usize = usize::MAX;

/// Pairs the vertices of the complete graph described by `weights` so that
/// every vertex is matched exactly once and the summed weight of the chosen
/// pairs is minimal.
///
/// Only the upper triangle of the matrix is read. Returned pairs are
/// `(i, j)` with `i < j`, ordered by `i`. For identical input the result is
/// identical.
pub fn min_weight_perfect_matching(weights: &Array2<f64>) -> PairingResult<Vec<(usize, usize)>> {
    let n = weights.nrows();
    if weights.ncols() != n {
        return Err(PairingError::invariant(format!(
            "weight matrix must be square, got {}x{}",
            n,
            weights.ncols()
        )));
    }
    if n % 2 != 0 {
        return Err(PairingError::invariant(format!(
            "expecting an even number of pairables, got {}",
            n
        )));
    }
    if n == 0 {
        return Ok(Vec::new());
    }

    let scaled = scale_weights(weights)?;
    let top = upper_triangle(n).map(|(i, j)| scaled[[i, j]]).max().unwrap_or(0);

    // Maximizing (top + 1 - w) over maximum cardinality matchings minimizes w
    // over perfect matchings, all edges keep a positive weight.
    let edges: Vec<(usize, usize, i64)> = upper_triangle(n)
        .map(|(i, j)| (i, j, top + 1 - scaled[[i, j]]))
        .collect();

    let mate = BlossomMatcher::new(n, &edges, true).solve()?;

    let mut pairs = Vec::with_capacity(n / 2);
    for (i, &j) in mate.iter().enumerate() {
        if j == NONE {
            return Err(PairingError::invariant(format!(
                "no perfect matching found, vertex {} left unmatched",
                i
            )));
        }
        if i < j {
            pairs.push((i, j));
        }
    }
    debug!("Matched {} vertices into {} pairs", n, pairs.len());
    Ok(pairs)
}

/// Sum of the weights of the given pairs
pub fn total_weight(weights: &Array2<f64>, pairs: &[(usize, usize)]) -> f64 {
    pairs.iter().map(|&(i, j)| weights[[i, j]]).sum()
}

fn upper_triangle(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n).flat_map(move |i| (i + 1..n).map(move |j| (i, j)))
}

fn scale_weights(weights: &Array2<f64>) -> PairingResult<Array2<i64>> {
    let mut scaled = Array2::<i64>::zeros(weights.raw_dim());
    for ((i, j), &w) in weights.indexed_iter() {
        if j <= i {
            continue;
        }
        let value = (w * WEIGHT_RESOLUTION).round();
        if !value.is_finite() || value.abs() > MAX_SCALED_WEIGHT {
            return Err(PairingError::invariant(format!(
                "edge weight {} between {} and {} is out of range",
                w, i, j
            )));
        }
        scaled[[i, j]] = value as i64;
    }
    Ok(scaled)
}

/// State of one maximum weight matching computation.
///
/// Vertices are `0..n`, blossoms `n..2n`. Edge `k` has the two endpoints
/// `2k` and `2k + 1`; an endpoint `p` is attached to vertex `endpoint[p]`
/// and `p ^ 1` is the other end of the same edge.
struct BlossomMatcher<'e> {
    edges: &'e [(usize, usize, i64)],
    n: usize,
    max_cardinality: bool,
    endpoint: Vec<usize>,
    neighbend: Vec<Vec<usize>>,
    /// Remote endpoint of the matched edge, per vertex
    mate: Vec<usize>,
    /// 0 free, 1 S (outer), 2 T (inner), 5 S while scanning, -1 unused
    label: Vec<i8>,
    labelend: Vec<usize>,
    inblossom: Vec<usize>,
    blossomparent: Vec<usize>,
    blossomchilds: Vec<Vec<usize>>,
    blossombase: Vec<usize>,
    blossomendps: Vec<Vec<usize>>,
    bestedge: Vec<usize>,
    blossombestedges: Vec<Option<Vec<usize>>>,
    unusedblossoms: Vec<usize>,
    dualvar: Vec<i64>,
    allowedge: Vec<bool>,
    queue: Vec<usize>,
}

impl<'e> BlossomMatcher<'e> {
    fn new(n: usize, edges: &'e [(usize, usize, i64)], max_cardinality: bool) -> Self {
        let max_weight = edges.iter().map(|e| e.2).max().unwrap_or(0).max(0);

        let endpoint = (0..2 * edges.len())
            .map(|p| if p % 2 == 0 { edges[p / 2].0 } else { edges[p / 2].1 })
            .collect();

        let mut neighbend = vec![Vec::new(); n];
        for (k, &(i, j, _)) in edges.iter().enumerate() {
            neighbend[i].push(2 * k + 1);
            neighbend[j].push(2 * k);
        }

        let mut dualvar = vec![max_weight; n];
        dualvar.extend(std::iter::repeat(0).take(n));

        let mut blossombase: Vec<usize> = (0..n).collect();
        blossombase.extend(std::iter::repeat(NONE).take(n));

        Self {
            edges,
            n,
            max_cardinality,
            endpoint,
            neighbend,
            mate: vec![NONE; n],
            label: vec![0; 2 * n],
            labelend: vec![NONE; 2 * n],
            inblossom: (0..n).collect(),
            blossomparent: vec![NONE; 2 * n],
            blossomchilds: vec![Vec::new(); 2 * n],
            blossombase,
            blossomendps: vec![Vec::new(); 2 * n],
            bestedge: vec![NONE; 2 * n],
            blossombestedges: vec![None; 2 * n],
            unusedblossoms: (n..2 * n).collect(),
            dualvar,
            allowedge: vec![false; edges.len()],
            queue: Vec::new(),
        }
    }

    /// Twice the slack of edge `k`
    fn slack(&self, k: usize) -> i64 {
        let (i, j, w) = self.edges[k];
        self.dualvar[i] + self.dualvar[j] - 2 * w
    }

    fn blossom_leaves(&self, b: usize) -> Vec<usize> {
        let mut leaves = Vec::new();
        self.collect_leaves(b, &mut leaves);
        leaves
    }

    fn collect_leaves(&self, b: usize, leaves: &mut Vec<usize>) {
        if b < self.n {
            leaves.push(b);
        } else {
            for &child in &self.blossomchilds[b] {
                self.collect_leaves(child, leaves);
            }
        }
    }

    /// Label the top-level blossom containing `w` with `t`, reached through
    /// endpoint `p`. A T label propagates an S label to the mate of the base.
    fn assign_label(&mut self, w: usize, t: i8, p: usize) {
        let b = self.inblossom[w];
        self.label[w] = t;
        self.label[b] = t;
        self.labelend[w] = p;
        self.labelend[b] = p;
        self.bestedge[w] = NONE;
        self.bestedge[b] = NONE;
        if t == 1 {
            let leaves = self.blossom_leaves(b);
            self.queue.extend(leaves);
        } else if t == 2 {
            let base = self.blossombase[b];
            let mate = self.mate[base];
            self.assign_label(self.endpoint[mate], 1, mate ^ 1);
        }
    }

    /// Trace back from `v` and `w` to find either a new blossom (returns its
    /// base) or an augmenting path (returns NONE).
    fn scan_blossom(&mut self, v: usize, w: usize) -> usize {
        let mut path = Vec::new();
        let mut base = NONE;
        let (mut v, mut w) = (v, w);
        while v != NONE || w != NONE {
            let mut b = self.inblossom[v];
            if self.label[b] == 5 {
                base = self.blossombase[b];
                break;
            }
            path.push(b);
            self.label[b] = 5;
            if self.labelend[b] == NONE {
                v = NONE;
            } else {
                v = self.endpoint[self.labelend[b]];
                b = self.inblossom[v];
                v = self.endpoint[self.labelend[b]];
            }
            if w != NONE {
                std::mem::swap(&mut v, &mut w);
            }
        }
        for b in path {
            self.label[b] = 1;
        }
        base
    }

    /// Build a blossom with the given base through the S-S edge `k`
    fn add_blossom(&mut self, base: usize, k: usize) -> PairingResult<()> {
        let (mut v, mut w, _) = self.edges[k];
        let bb = self.inblossom[base];
        let mut bv = self.inblossom[v];
        let mut bw = self.inblossom[w];
        let b = self
            .unusedblossoms
            .pop()
            .ok_or_else(|| PairingError::invariant("blossom pool exhausted"))?;

        self.blossombase[b] = base;
        self.blossomparent[b] = NONE;
        self.blossomparent[bb] = b;

        let mut path = Vec::new();
        let mut endps = Vec::new();
        while bv != bb {
            self.blossomparent[bv] = b;
            path.push(bv);
            endps.push(self.labelend[bv]);
            v = self.endpoint[self.labelend[bv]];
            bv = self.inblossom[v];
        }
        path.push(bb);
        path.reverse();
        endps.reverse();
        endps.push(2 * k);
        while bw != bb {
            self.blossomparent[bw] = b;
            path.push(bw);
            endps.push(self.labelend[bw] ^ 1);
            w = self.endpoint[self.labelend[bw]];
            bw = self.inblossom[w];
        }

        self.label[b] = 1;
        self.labelend[b] = self.labelend[bb];
        self.dualvar[b] = 0;
        self.blossomchilds[b] = path.clone();
        self.blossomendps[b] = endps;

        for leaf in self.blossom_leaves(b) {
            if self.label[self.inblossom[leaf]] == 2 {
                // Former T vertices become S vertices
                self.queue.push(leaf);
            }
            self.inblossom[leaf] = b;
        }

        // Least-slack edges from the new blossom to each neighbouring S blossom
        let mut bestedgeto = vec![NONE; 2 * self.n];
        for &child in &path {
            let neighbour_lists: Vec<Vec<usize>> = match self.blossombestedges[child].take() {
                Some(list) => vec![list],
                None => self
                    .blossom_leaves(child)
                    .into_iter()
                    .map(|leaf| self.neighbend[leaf].iter().map(|p| p / 2).collect())
                    .collect(),
            };
            for list in neighbour_lists {
                for edge in list {
                    let (i, j, _) = self.edges[edge];
                    let j = if self.inblossom[j] == b { i } else { j };
                    let bj = self.inblossom[j];
                    if bj != b
                        && self.label[bj] == 1
                        && (bestedgeto[bj] == NONE || self.slack(edge) < self.slack(bestedgeto[bj]))
                    {
                        bestedgeto[bj] = edge;
                    }
                }
            }
            self.blossombestedges[child] = None;
            self.bestedge[child] = NONE;
        }

        let best: Vec<usize> = bestedgeto.into_iter().filter(|&e| e != NONE).collect();
        self.bestedge[b] = NONE;
        for &edge in &best {
            if self.bestedge[b] == NONE || self.slack(edge) < self.slack(self.bestedge[b]) {
                self.bestedge[b] = edge;
            }
        }
        self.blossombestedges[b] = Some(best);
        Ok(())
    }

    /// Dissolve blossom `b`, relabelling its children when it was a T blossom
    /// expanded in the middle of a stage.
    fn expand_blossom(&mut self, b: usize, endstage: bool) {
        let childs = self.blossomchilds[b].clone();
        for &s in &childs {
            self.blossomparent[s] = NONE;
            if s < self.n {
                self.inblossom[s] = s;
            } else if endstage && self.dualvar[s] == 0 {
                self.expand_blossom(s, endstage);
            } else {
                for leaf in self.blossom_leaves(s) {
                    self.inblossom[leaf] = s;
                }
            }
        }

        if !endstage && self.label[b] == 2 {
            let len = childs.len() as isize;
            let at = |j: isize| j.rem_euclid(len) as usize;
            let endps = self.blossomendps[b].clone();

            let entrychild = self.inblossom[self.endpoint[self.labelend[b] ^ 1]];
            let mut j = childs.iter().position(|&c| c == entrychild).unwrap_or(0) as isize;
            let (jstep, endptrick): (isize, usize) = if j & 1 == 1 {
                j -= len;
                (1, 0)
            } else {
                (-1, 1)
            };

            // Walk from the entry child to the base, relabelling the even path
            let mut p = self.labelend[b];
            while j != 0 {
                self.label[self.endpoint[p ^ 1]] = 0;
                let q = endps[at(j - endptrick as isize)];
                self.label[self.endpoint[q ^ endptrick ^ 1]] = 0;
                self.assign_label(self.endpoint[p ^ 1], 2, p);
                self.allowedge[q / 2] = true;
                j += jstep;
                p = endps[at(j - endptrick as isize)] ^ endptrick;
                self.allowedge[p / 2] = true;
                j += jstep;
            }

            let bv = childs[at(j)];
            let entry = self.endpoint[p ^ 1];
            self.label[entry] = 2;
            self.label[bv] = 2;
            self.labelend[entry] = p;
            self.labelend[bv] = p;
            self.bestedge[bv] = NONE;
            j += jstep;

            // Children on the odd path keep a T label only if reached from outside
            while childs[at(j)] != entrychild {
                let bv = childs[at(j)];
                if self.label[bv] == 1 {
                    j += jstep;
                    continue;
                }
                let reached = self
                    .blossom_leaves(bv)
                    .into_iter()
                    .find(|&leaf| self.label[leaf] != 0);
                if let Some(leaf) = reached {
                    self.label[leaf] = 0;
                    let base_mate = self.mate[self.blossombase[bv]];
                    self.label[self.endpoint[base_mate]] = 0;
                    self.assign_label(leaf, 2, self.labelend[leaf]);
                }
                j += jstep;
            }
        }

        self.label[b] = -1;
        self.labelend[b] = NONE;
        self.blossomchilds[b] = Vec::new();
        self.blossomendps[b] = Vec::new();
        self.blossombase[b] = NONE;
        self.blossombestedges[b] = None;
        self.bestedge[b] = NONE;
        self.unusedblossoms.push(b);
    }

    /// Swap matched and unmatched edges on the path from vertex `v` to the
    /// base of blossom `b`, making `v` the new base.
    fn augment_blossom(&mut self, b: usize, v: usize) {
        let mut t = v;
        while self.blossomparent[t] != b {
            t = self.blossomparent[t];
        }
        if t >= self.n {
            self.augment_blossom(t, v);
        }

        let len = self.blossomchilds[b].len() as isize;
        let at = |j: isize| j.rem_euclid(len) as usize;
        let i = self.blossomchilds[b].iter().position(|&c| c == t).unwrap_or(0);
        let mut j = i as isize;
        let (jstep, endptrick): (isize, usize) = if j & 1 == 1 {
            j -= len;
            (1, 0)
        } else {
            (-1, 1)
        };

        while j != 0 {
            j += jstep;
            t = self.blossomchilds[b][at(j)];
            let p = self.blossomendps[b][at(j - endptrick as isize)] ^ endptrick;
            if t >= self.n {
                self.augment_blossom(t, self.endpoint[p]);
            }
            j += jstep;
            t = self.blossomchilds[b][at(j)];
            if t >= self.n {
                self.augment_blossom(t, self.endpoint[p ^ 1]);
            }
            self.mate[self.endpoint[p]] = p ^ 1;
            self.mate[self.endpoint[p ^ 1]] = p;
        }

        self.blossomchilds[b].rotate_left(i);
        self.blossomendps[b].rotate_left(i);
        self.blossombase[b] = self.blossombase[self.blossomchilds[b][0]];
    }

    /// Augment the matching along the path through the S-S edge `k`
    fn augment_matching(&mut self, k: usize) {
        let (v, w, _) = self.edges[k];
        for (start, endpoint) in [(v, 2 * k + 1), (w, 2 * k)] {
            let (mut s, mut p) = (start, endpoint);
            loop {
                let bs = self.inblossom[s];
                if bs >= self.n {
                    self.augment_blossom(bs, s);
                }
                self.mate[s] = p;
                if self.labelend[bs] == NONE {
                    // Reached a single free vertex
                    break;
                }
                let t = self.endpoint[self.labelend[bs]];
                let bt = self.inblossom[t];
                s = self.endpoint[self.labelend[bt]];
                let j = self.endpoint[self.labelend[bt] ^ 1];
                if bt >= self.n {
                    self.augment_blossom(bt, j);
                }
                self.mate[j] = self.labelend[bt];
                p = self.labelend[bt] ^ 1;
            }
        }
    }

    /// Runs the stages and returns, per vertex, its matched vertex or NONE
    fn solve(mut self) -> PairingResult<Vec<usize>> {
        let n = self.n;
        if self.edges.is_empty() {
            return Ok(vec![NONE; n]);
        }

        for _ in 0..n {
            self.label.fill(0);
            self.bestedge.fill(NONE);
            for b in n..2 * n {
                self.blossombestedges[b] = None;
            }
            self.allowedge.fill(false);
            self.queue.clear();

            for v in 0..n {
                if self.mate[v] == NONE && self.label[self.inblossom[v]] == 0 {
                    self.assign_label(v, 1, NONE);
                }
            }

            let mut augmented = false;
            loop {
                while !augmented {
                    let Some(v) = self.queue.pop() else { break };
                    for idx in 0..self.neighbend[v].len() {
                        let p = self.neighbend[v][idx];
                        let k = p / 2;
                        let w = self.endpoint[p];
                        if self.inblossom[v] == self.inblossom[w] {
                            continue;
                        }
                        let mut kslack = 0;
                        if !self.allowedge[k] {
                            kslack = self.slack(k);
                            if kslack <= 0 {
                                self.allowedge[k] = true;
                            }
                        }
                        if self.allowedge[k] {
                            if self.label[self.inblossom[w]] == 0 {
                                self.assign_label(w, 2, p ^ 1);
                            } else if self.label[self.inblossom[w]] == 1 {
                                let base = self.scan_blossom(v, w);
                                if base != NONE {
                                    self.add_blossom(base, k)?;
                                } else {
                                    self.augment_matching(k);
                                    augmented = true;
                                    break;
                                }
                            } else if self.label[w] == 0 {
                                // Inside a T blossom, remember how w was reached
                                self.label[w] = 2;
                                self.labelend[w] = p ^ 1;
                            }
                        } else if self.label[self.inblossom[w]] == 1 {
                            let b = self.inblossom[v];
                            if self.bestedge[b] == NONE || kslack < self.slack(self.bestedge[b]) {
                                self.bestedge[b] = k;
                            }
                        } else if self.label[w] == 0
                            && (self.bestedge[w] == NONE || kslack < self.slack(self.bestedge[w]))
                        {
                            self.bestedge[w] = k;
                        }
                    }
                }
                if augmented {
                    break;
                }

                // No augmenting path with the current duals, adjust them
                let mut deltatype = 0u8;
                let mut delta = 0i64;
                let mut deltaedge = NONE;
                let mut deltablossom = NONE;

                if !self.max_cardinality {
                    deltatype = 1;
                    delta = self.dualvar[..n].iter().copied().min().unwrap_or(0);
                }

                for v in 0..n {
                    if self.label[self.inblossom[v]] == 0 && self.bestedge[v] != NONE {
                        let d = self.slack(self.bestedge[v]);
                        if deltatype == 0 || d < delta {
                            delta = d;
                            deltatype = 2;
                            deltaedge = self.bestedge[v];
                        }
                    }
                }

                for b in 0..2 * n {
                    if self.blossomparent[b] == NONE && self.label[b] == 1 && self.bestedge[b] != NONE {
                        // Slack between two S blossoms is always even
                        let d = self.slack(self.bestedge[b]) / 2;
                        if deltatype == 0 || d < delta {
                            delta = d;
                            deltatype = 3;
                            deltaedge = self.bestedge[b];
                        }
                    }
                }

                for b in n..2 * n {
                    if self.blossombase[b] != NONE
                        && self.blossomparent[b] == NONE
                        && self.label[b] == 2
                        && (deltatype == 0 || self.dualvar[b] < delta)
                    {
                        delta = self.dualvar[b];
                        deltatype = 4;
                        deltablossom = b;
                    }
                }

                if deltatype == 0 {
                    // Maximum cardinality reached, finish with optimal duals
                    deltatype = 1;
                    delta = self.dualvar[..n].iter().copied().min().unwrap_or(0).max(0);
                }

                for v in 0..n {
                    match self.label[self.inblossom[v]] {
                        1 => self.dualvar[v] -= delta,
                        2 => self.dualvar[v] += delta,
                        _ => {}
                    }
                }
                for b in n..2 * n {
                    if self.blossombase[b] != NONE && self.blossomparent[b] == NONE {
                        match self.label[b] {
                            1 => self.dualvar[b] += delta,
                            2 => self.dualvar[b] -= delta,
                            _ => {}
                        }
                    }
                }

                match deltatype {
                    1 => break,
                    2 => {
                        self.allowedge[deltaedge] = true;
                        let (i, j, _) = self.edges[deltaedge];
                        let s = if self.label[self.inblossom[i]] == 0 { j } else { i };
                        self.queue.push(s);
                    }
                    3 => {
                        self.allowedge[deltaedge] = true;
                        let (i, _, _) = self.edges[deltaedge];
                        self.queue.push(i);
                    }
                    _ => self.expand_blossom(deltablossom, false),
                }
            }

            if !augmented {
                break;
            }

            // Expand S blossoms whose dual dropped to zero
            for b in n..2 * n {
                if self.blossomparent[b] == NONE
                    && self.blossombase[b] != NONE
                    && self.label[b] == 1
                    && self.dualvar[b] == 0
                {
                    self.expand_blossom(b, true);
                }
            }
        }

        Ok(self
            .mate
            .iter()
            .map(|&p| if p == NONE { NONE } else { self.endpoint[p] })
            .collect())
    }
}
