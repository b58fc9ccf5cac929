//! 音频声道布局定义.
//!
//! EBL 采样只有单声道和立体声两种布局, 由声道 B 是否为空决定.

use serde::Serialize;
use std::fmt;

/// 声道布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelLayout {
    /// 单声道 (仅声道 A)
    Mono,
    /// 立体声 (声道 A 为左, 声道 B 为右)
    Stereo,
}

impl ChannelLayout {
    /// 根据声道 B 的字节数确定布局: 为 0 即单声道
    pub fn from_channel_b_len(len: usize) -> Self {
        if len == 0 { Self::Mono } else { Self::Stereo }
    }

    /// 声道数量
    pub fn channels(self) -> u16 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }
}

impl fmt::Display for ChannelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mono => write!(f, "mono"),
            Self::Stereo => write!(f, "stereo"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_布局判定() {
        assert_eq!(ChannelLayout::from_channel_b_len(0), ChannelLayout::Mono);
        assert_eq!(ChannelLayout::from_channel_b_len(2), ChannelLayout::Stereo);
        assert_eq!(ChannelLayout::Mono.channels(), 1);
        assert_eq!(ChannelLayout::Stereo.channels(), 2);
        assert_eq!(ChannelLayout::Stereo.to_string(), "stereo");
    }
}
