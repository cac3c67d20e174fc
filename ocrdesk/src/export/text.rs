use crate::structure::TextBlock;

pub fn render(blocks: &[TextBlock]) -> String {
    blocks
        .iter()
        .map(|block| block.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
