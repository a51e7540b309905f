//! Local graph access without materialising the whole graph.
//!
//! The [`LocalGraph`] trait is the capability set shared by the in-memory
//! [`Graph`] and the file-backed [`AdjacencyListLocalGraph`]: local
//! algorithms that only probe degrees and neighbourhoods can consume either
//! backing store uniformly.
//!
//! The adjacency-list format stores one vertex per line,
//!
//! ```text
//! vertex_id: neighbor1[weight],neighbor2[weight],...
//! ```
//!
//! with the bracketed weight optional (unit weight when omitted) and lines
//! sorted by vertex id. Sorted lines allow a binary search over byte
//! offsets, so a neighbourhood query reads only a logarithmic number of
//! lines from disk.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::graph::{Edge, Graph};

/// Capability set for local neighbourhood queries.
///
/// Methods take `&mut self` because file-backed implementations maintain
/// read caches.
pub trait LocalGraph {
    /// Weighted degree of `v`.
    fn degree(&mut self, v: usize) -> Result<f64>;

    /// Unweighted degree of `v`.
    fn degree_unweighted(&mut self, v: usize) -> Result<usize>;

    /// Edges incident to `v`.
    fn neighbors(&mut self, v: usize) -> Result<Vec<Edge>>;

    /// Neighbour vertex ids of `v`.
    fn neighbors_unweighted(&mut self, v: usize) -> Result<Vec<usize>>;

    /// Whether `v` is a vertex of the graph.
    fn vertex_exists(&mut self, v: usize) -> bool;

    /// Weighted degrees of a batch of vertices.
    fn degrees(&mut self, vertices: &[usize]) -> Result<Vec<f64>> {
        vertices.iter().map(|&v| self.degree(v)).collect()
    }

    /// Unweighted degrees of a batch of vertices.
    fn degrees_unweighted(&mut self, vertices: &[usize]) -> Result<Vec<usize>> {
        vertices.iter().map(|&v| self.degree_unweighted(v)).collect()
    }
}

impl LocalGraph for Graph {
    fn degree(&mut self, v: usize) -> Result<f64> {
        Graph::degree(self, v)
    }

    fn degree_unweighted(&mut self, v: usize) -> Result<usize> {
        Graph::degree_unweighted(self, v)
    }

    fn neighbors(&mut self, v: usize) -> Result<Vec<Edge>> {
        Graph::neighbors(self, v)
    }

    fn neighbors_unweighted(&mut self, v: usize) -> Result<Vec<usize>> {
        Graph::neighbors_unweighted(self, v)
    }

    fn vertex_exists(&mut self, v: usize) -> bool {
        Graph::vertex_exists(self, v)
    }
}

/// A local graph backed by an adjacency-list file on disk.
///
/// Vertices are located by binary search over byte offsets. Probed offsets
/// and parsed neighbourhoods are cached, so repeated queries touch the file
/// at most once per vertex.
pub struct AdjacencyListLocalGraph {
    reader: BufReader<File>,
    end_of_file: u64,
    /// Offset probed during binary search -> vertex id of the next content
    /// line (None when the probe ran off the end of the file).
    offset_probes: HashMap<u64, Option<usize>>,
    edge_cache: HashMap<usize, Vec<Edge>>,
}

impl AdjacencyListLocalGraph {
    /// Open an adjacency-list file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be opened or its length determined.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let end_of_file = file.metadata()?.len();
        debug!(
            "Opened adjacency list {:?} ({} bytes)",
            path.as_ref(),
            end_of_file
        );
        Ok(Self {
            reader: BufReader::new(file),
            end_of_file,
            offset_probes: HashMap::new(),
            edge_cache: HashMap::new(),
        })
    }

    /// Read the next content line at or after `offset`. A content line is a
    /// non-empty line containing a `:` separator; other lines are skipped.
    /// Returns `None` when no content line exists before the end of file.
    fn read_content_line_after(&mut self, offset: u64) -> Result<Option<(usize, String)>> {
        self.reader.seek(SeekFrom::Start(offset))?;
        let mut line = String::new();
        if offset != 0 {
            // The offset may point into the middle of a line; discard the
            // remainder so reading resumes at a line boundary.
            self.reader.read_line(&mut line)?;
        }
        loop {
            if self.reader.stream_position()? >= self.end_of_file {
                return Ok(None);
            }
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let content = line.trim();
            let Some((lhs, _)) = content.split_once(':') else {
                continue;
            };
            let id: usize = lhs.trim().parse().map_err(|_| {
                Error::runtime(format!("malformed vertex id in line: {content}"))
            })?;
            return Ok(Some((id, content.to_string())));
        }
    }

    /// Vertex id of the content line following `offset`, with probe caching.
    fn probe(&mut self, offset: u64) -> Result<Option<usize>> {
        if let Some(&cached) = self.offset_probes.get(&offset) {
            return Ok(cached);
        }
        let id = self.read_content_line_after(offset)?.map(|(id, _)| id);
        self.offset_probes.insert(offset, id);
        Ok(id)
    }

    /// Binary search the file for the content line of vertex `v`.
    ///
    /// # Errors
    ///
    /// `Runtime` if the vertex is not present; `Io` on read failure.
    fn find_vertex_line(&mut self, v: usize) -> Result<String> {
        let mut range_min: i64 = 0;
        let mut range_max: i64 = self.end_of_file as i64;

        loop {
            if range_min > range_max {
                return Err(Error::runtime(format!(
                    "vertex {} not found in adjacency list",
                    v
                )));
            }
            let search_point = (range_min + range_max) / 2;
            let current = self.probe(search_point as u64)?;
            trace!("Probe at offset {} found vertex {:?}", search_point, current);

            match current {
                Some(id) if id == v => {
                    // Cached probes do not retain the line text; re-read it.
                    let (_, line) = self
                        .read_content_line_after(search_point as u64)?
                        .ok_or_else(|| {
                            Error::runtime("adjacency list changed during reading")
                        })?;
                    return Ok(line);
                }
                Some(id) if id > v => range_max = search_point - 1,
                Some(_) => range_min = search_point + 1,
                None => range_max = search_point - 1,
            }
        }
    }

    fn edges(&mut self, v: usize) -> Result<Vec<Edge>> {
        if let Some(edges) = self.edge_cache.get(&v) {
            return Ok(edges.clone());
        }
        let line = self.find_vertex_line(v)?;
        let (_, edges) = parse_content_line(&line)?;
        self.edge_cache.insert(v, edges.clone());
        Ok(edges)
    }
}

impl LocalGraph for AdjacencyListLocalGraph {
    fn degree(&mut self, v: usize) -> Result<f64> {
        Ok(self.edges(v)?.iter().map(|e| e.weight).sum())
    }

    fn degree_unweighted(&mut self, v: usize) -> Result<usize> {
        Ok(self.edges(v)?.len())
    }

    fn neighbors(&mut self, v: usize) -> Result<Vec<Edge>> {
        self.edges(v)
    }

    fn neighbors_unweighted(&mut self, v: usize) -> Result<Vec<usize>> {
        Ok(self.edges(v)?.iter().map(|e| e.v2).collect())
    }

    fn vertex_exists(&mut self, v: usize) -> bool {
        self.edges(v).is_ok()
    }
}

/// Parse one adjacency-list content line into its vertex id and edges.
fn parse_content_line(line: &str) -> Result<(usize, Vec<Edge>)> {
    let (lhs, rhs) = line
        .split_once(':')
        .ok_or_else(|| Error::runtime(format!("malformed adjacency list line: {line}")))?;
    let v: usize = lhs
        .trim()
        .parse()
        .map_err(|_| Error::runtime(format!("malformed vertex id in line: {line}")))?;

    let mut edges = Vec::new();
    for token in rhs.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let (neighbor, weight) = match token.split_once('[') {
            Some((u, w)) => {
                let w = w.strip_suffix(']').ok_or_else(|| {
                    Error::runtime(format!("unterminated weight in token: {token}"))
                })?;
                (
                    u.trim().parse::<usize>(),
                    w.trim().parse::<f64>().map_err(|_| {
                        Error::runtime(format!("malformed weight in token: {token}"))
                    })?,
                )
            }
            None => (token.parse::<usize>(), 1.0),
        };
        let neighbor = neighbor
            .map_err(|_| Error::runtime(format!("malformed neighbor id in token: {token}")))?;
        edges.push(Edge { v1: v, v2: neighbor, weight });
    }
    Ok((v, edges))
}
