#[cfg(test)]
mod test_data;
#[cfg(test)]
mod test_graph;
#[cfg(test)]
mod test_kde;
#[cfg(test)]
mod test_lsh;

/// Initialise test logging once; repeated calls are no-ops.
pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}
