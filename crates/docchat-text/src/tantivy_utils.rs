use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::{TextAnalyzer, WhitespaceTokenizer};
use tantivy::Index;

pub const CHUNK_TOKENIZER: &str = "chunk_terms";

/// Field handles of the chunk schema.
#[derive(Debug, Clone, Copy)]
pub struct ChunkFields {
	pub id: Field,
	pub text: Field,
	/// Full chunk serialized as JSON, returned with hits.
	pub payload: Field,
}

pub fn build_schema() -> (Schema, ChunkFields) {
	let mut schema_builder = Schema::builder();
	let id = schema_builder.add_text_field("id", STRING | STORED);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(CHUNK_TOKENIZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let text = schema_builder.add_text_field("text", TextOptions::default().set_indexing_options(text_field_indexing));
	let payload = schema_builder.add_text_field("payload", STORED);
	(schema_builder.build(), ChunkFields { id, text, payload })
}

/// Whitespace splitting, no case folding or stop words: the same terms the
/// scroll BM25 adapter sees.
pub fn register_tokenizer(index: &Index) {
	let tokenizer = TextAnalyzer::builder(WhitespaceTokenizer::default()).build();
	index.tokenizers().register(CHUNK_TOKENIZER, tokenizer);
}

/// Directory name of a namespace's index. Names made of ASCII letters,
/// digits, `-` and `_` are kept readable; anything else is hex encoded.
pub fn namespace_dir_name(namespace: &str) -> String {
	let plain = !namespace.is_empty() && namespace.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
	if plain {
		format!("ns-{namespace}")
	} else {
		let hex: String = namespace.bytes().map(|b| format!("{b:02x}")).collect();
		format!("hex-{hex}")
	}
}
