//! 定长文本字段解码.
//!
//! EBL 文件中的文件名和注释都是 64 字节的 UTF-16LE 字段, 不足部分以 NUL 填充.

use encoding_rs::UTF_16LE;
use log::debug;

/// 解码 UTF-16LE 定长字段, 去除末尾的 NUL 填充
///
/// 奇数长度时忽略最后一个字节. 非法代理项替换为 U+FFFD.
pub fn decode_utf16le_field(data: &[u8]) -> String {
    let even = &data[..data.len() & !1];
    let (text, had_errors) = UTF_16LE.decode_without_bom_handling(even);
    if had_errors {
        debug!("UTF-16LE 字段包含无效代理项, 已替换");
    }
    text.trim_end_matches('\0').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 将字符串编码为指定长度的 UTF-16LE 定长字段
    fn encode_field(text: &str, len: usize) -> Vec<u8> {
        let mut buf: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
        buf.resize(len, 0);
        buf
    }

    #[test]
    fn test_解码_去除末尾填充() {
        let field = encode_field("Warm Pad", 64);
        assert_eq!(decode_utf16le_field(&field), "Warm Pad");
    }

    #[test]
    fn test_解码_非_ascii() {
        let field = encode_field("Flöte ß", 64);
        assert_eq!(decode_utf16le_field(&field), "Flöte ß");
    }

    #[test]
    fn test_解码_全零字段() {
        assert_eq!(decode_utf16le_field(&[0u8; 64]), "");
    }

    #[test]
    fn test_解码_奇数长度() {
        let mut field = encode_field("AB", 4);
        field.push(0x41);
        assert_eq!(decode_utf16le_field(&field), "AB");
    }
}
