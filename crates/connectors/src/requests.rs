/// One page of a partition range scan.
///
/// `offset`/`limit` are absolute row positions in the source table's scan
/// order; the worker advances `offset` by the rows it has already copied so
/// each fetch stays bounded by its batch size.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub table: String,
    pub order_column: Option<String>,
    pub offset: u64,
    pub limit: u64,
}
