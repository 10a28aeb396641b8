/*!
 * Multi-way merge of pairwise alignments that share one source sequence.
 *
 * Every sentence pair that co-occurs in a bead becomes an edge between
 * (language, index) nodes, weighted by the bead confidence. Connected
 * components are the multi-parallel groups.
 */

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::app_config::MergeConfig;
use crate::errors::AlignError;

use super::types::{Alignment, AlignmentRecord};

/// One sentence of one language
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SentenceNode {
    pub language: String,
    pub index: usize,
}

impl SentenceNode {
    pub fn new(language: impl Into<String>, index: usize) -> Self {
        Self {
            language: language.into(),
            index,
        }
    }
}

/// Undirected graph of aligned sentences; parallel edges keep the lowest weight
#[derive(Debug, Clone, Default)]
pub struct AlignmentGraph {
    languages: BTreeSet<String>,
    nodes: BTreeSet<SentenceNode>,
    edges: BTreeMap<(SentenceNode, SentenceNode), f32>,
}

impl AlignmentGraph {
    /// Empty graph for the given source language
    pub fn new(source_language: &str) -> Self {
        let mut graph = Self::default();
        graph.languages.insert(source_language.to_string());
        graph
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.iter().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Weight of the edge between two nodes, in either order
    pub fn edge_weight(&self, a: &SentenceNode, b: &SentenceNode) -> Option<f32> {
        let key = if a <= b { (a.clone(), b.clone()) } else { (b.clone(), a.clone()) };
        self.edges.get(&key).copied()
    }

    pub fn add_edge(&mut self, a: SentenceNode, b: SentenceNode, weight: f32) {
        self.languages.insert(a.language.clone());
        self.languages.insert(b.language.clone());
        self.nodes.insert(a.clone());
        self.nodes.insert(b.clone());
        let key = if a <= b { (a, b) } else { (b, a) };
        self.edges
            .entry(key)
            .and_modify(|w| *w = w.min(weight))
            .or_insert(weight);
    }

    /// Add one pairwise alignment in its persisted form.
    ///
    /// All indices are checked against the sequence lengths before any edge
    /// is added; gap beads contribute nothing.
    pub fn add_record(
        &mut self,
        source: (&str, usize),
        target: (&str, usize),
        record: &AlignmentRecord,
        weights: &[f32],
    ) -> Result<(), AlignError> {
        if record.src.len() != record.tgt.len() {
            return Err(AlignError::InconsistentInput(format!(
                "{} source spans but {} target spans for '{}'",
                record.src.len(),
                record.tgt.len(),
                target.0
            )));
        }
        if weights.len() != record.len() {
            return Err(AlignError::InconsistentInput(format!(
                "{} beads but {} scores for '{}'",
                record.len(),
                weights.len(),
                target.0
            )));
        }
        for (src, tgt) in record.pairs() {
            check_bounds(source, src)?;
            check_bounds(target, tgt)?;
        }

        self.languages.insert(source.0.to_string());
        self.languages.insert(target.0.to_string());
        for ((src, tgt), &weight) in record.pairs().zip(weights) {
            for &s in src {
                for &t in tgt {
                    self.add_edge(SentenceNode::new(source.0, s), SentenceNode::new(target.0, t), weight);
                }
            }
        }
        Ok(())
    }

    /// Add a freshly computed alignment, weighted by bead confidence
    pub fn add_alignment(
        &mut self,
        source: (&str, usize),
        target: (&str, usize),
        alignment: &Alignment,
    ) -> Result<(), AlignError> {
        self.add_record(source, target, &alignment.to_record(), &alignment.confidences())
    }

    /// Connected components, ordered by their smallest node
    pub fn components(&self) -> MultiAlignment {
        let nodes: Vec<&SentenceNode> = self.nodes.iter().collect();
        let ids: HashMap<&SentenceNode, usize> = nodes.iter().enumerate().map(|(i, n)| (*n, i)).collect();
        let mut sets = DisjointSet::new(nodes.len());
        for (a, b) in self.edges.keys() {
            sets.union(ids[a], ids[b]);
        }

        let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for id in 0..nodes.len() {
            members.entry(sets.find(id)).or_default().push(id);
        }
        let mut confidence: HashMap<usize, f32> = HashMap::new();
        for ((a, _), &weight) in &self.edges {
            let root = sets.find(ids[a]);
            confidence
                .entry(root)
                .and_modify(|c| *c = c.min(weight))
                .or_insert(weight);
        }

        let groups = members
            .into_iter()
            .map(|(root, ids)| {
                let mut sentences: BTreeMap<String, Vec<usize>> =
                    self.languages.iter().map(|l| (l.clone(), Vec::new())).collect();
                for id in ids {
                    let node = nodes[id];
                    sentences.entry(node.language.clone()).or_default().push(node.index);
                }
                MultiGroup {
                    sentences,
                    confidence: confidence.get(&root).copied().unwrap_or(0.0),
                }
            })
            .collect();

        MultiAlignment { groups }
    }
}

fn check_bounds((language, len): (&str, usize), indices: &[usize]) -> Result<(), AlignError> {
    match indices.iter().find(|&&i| i >= len) {
        Some(&index) => Err(AlignError::IndexOutOfBounds {
            language: language.to_string(),
            index,
            len,
        }),
        None => Ok(()),
    }
}

/// Union-find whose representative is always the smallest member
#[derive(Debug)]
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}

/// One multi-parallel group: sorted indices per language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiGroup {
    pub sentences: BTreeMap<String, Vec<usize>>,
    /// Lowest edge weight inside the component
    pub confidence: f32,
}

impl MultiGroup {
    /// Exactly one sentence in every language
    pub fn is_one_to_one(&self) -> bool {
        self.sentences.values().all(|indices| indices.len() == 1)
    }

    /// `{language: text}` with multi-sentence islands joined by a space.
    ///
    /// Languages missing from `corpora` are left out.
    pub fn sentence_row(&self, corpora: &HashMap<String, Vec<String>>) -> BTreeMap<String, String> {
        self.sentences
            .iter()
            .filter_map(|(language, indices)| {
                let sents = corpora.get(language)?;
                let text = indices
                    .iter()
                    .filter_map(|&i| sents.get(i).map(String::as_str))
                    .collect::<Vec<_>>()
                    .join(" ");
                Some((language.clone(), text))
            })
            .collect()
    }
}

/// Which groups are exported
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MergePolicy {
    pub min_confidence: Option<f32>,
    pub one_to_one_only: bool,
}

impl MergePolicy {
    pub fn keeps(&self, group: &MultiGroup) -> bool {
        if self.one_to_one_only && !group.is_one_to_one() {
            return false;
        }
        self.min_confidence.is_none_or(|min| group.confidence >= min)
    }
}

impl From<&MergeConfig> for MergePolicy {
    fn from(config: &MergeConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
            one_to_one_only: config.one_to_one_only,
        }
    }
}

/// All groups of one document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiAlignment {
    pub groups: Vec<MultiGroup>,
}

impl MultiAlignment {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Per language, the index list of every group
    pub fn index_lists(&self) -> BTreeMap<String, Vec<Vec<usize>>> {
        let mut lists: BTreeMap<String, Vec<Vec<usize>>> = BTreeMap::new();
        for group in &self.groups {
            for (language, indices) in &group.sentences {
                lists.entry(language.clone()).or_default().push(indices.clone());
            }
        }
        lists
    }

    pub fn confidences(&self) -> Vec<f32> {
        self.groups.iter().map(|g| g.confidence).collect()
    }

    /// Groups kept by `policy`, in order
    pub fn filtered<'a>(&'a self, policy: &'a MergePolicy) -> impl Iterator<Item = &'a MultiGroup> + 'a {
        self.groups.iter().filter(move |g| policy.keeps(g))
    }
}
