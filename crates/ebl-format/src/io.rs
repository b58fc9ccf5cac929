//! I/O 抽象层.
//!
//! 提供统一的读写接口, 支持文件和内存缓冲区两种后端.
//! 解码器只通过 [`IoContext`] 访问输入流, 不关心数据来源.

use ebl_core::{EblError, EblResult};
use std::io::{self, Read, Seek, Write};
use std::path::Path;

/// I/O 上下文
///
/// 封装底层 I/O 操作, 为解封装器/封装器提供统一的数据读写接口.
pub struct IoContext {
    /// 内部 I/O 实现
    inner: Box<dyn IoBackend>,
    /// 读缓冲区
    buffer: Vec<u8>,
    /// 缓冲区中的有效数据长度
    buf_len: usize,
    /// 缓冲区当前读取位置
    buf_pos: usize,
}

/// I/O 后端 trait
///
/// 实现此 trait 以支持不同的 I/O 来源 (文件、内存等).
pub trait IoBackend: Send {
    /// 读取数据到缓冲区
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    /// 全部写入
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;
    /// 定位 (seek)
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64>;
    /// 获取当前位置
    fn position(&mut self) -> io::Result<u64>;
    /// 获取总大小 (如果可知)
    fn size(&self) -> Option<u64>;
    /// 是否支持 seek
    fn is_seekable(&self) -> bool;
    /// 刷新写缓冲
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// 默认缓冲区大小 (32 KB)
const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

impl IoContext {
    /// 从 I/O 后端创建上下文
    pub fn new(backend: Box<dyn IoBackend>) -> Self {
        Self {
            inner: backend,
            buffer: vec![0u8; DEFAULT_BUFFER_SIZE],
            buf_len: 0,
            buf_pos: 0,
        }
    }

    /// 从内存数据创建只读上下文
    pub fn from_data(data: Vec<u8>) -> Self {
        Self::new(Box::new(MemoryBackend::from_data(data)))
    }

    /// 从文件路径打开 (只读)
    pub fn open_read(path: impl AsRef<Path>) -> EblResult<Self> {
        let file = std::fs::File::open(path)?;
        Ok(Self::new(Box::new(FileBackend::new(file))))
    }

    /// 从文件路径打开 (写入)
    pub fn open_write(path: impl AsRef<Path>) -> EblResult<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(FileBackend::new(file))))
    }

    // ========================
    // 读取方法
    // ========================

    /// 读取指定字节数
    pub fn read_exact(&mut self, buf: &mut [u8]) -> EblResult<()> {
        let filled = self.read_up_to(buf)?;
        if filled < buf.len() {
            return Err(EblError::Eof);
        }
        Ok(())
    }

    /// 尽量填满缓冲区, 返回实际读取的字节数
    ///
    /// 只有到达流末尾时返回值才会小于 `buf.len()`.
    pub fn read_up_to(&mut self, buf: &mut [u8]) -> EblResult<usize> {
        let mut total_read = 0;
        while total_read < buf.len() {
            let buffered = self.buf_len - self.buf_pos;
            if buffered > 0 {
                let to_copy = buffered.min(buf.len() - total_read);
                buf[total_read..total_read + to_copy]
                    .copy_from_slice(&self.buffer[self.buf_pos..self.buf_pos + to_copy]);
                self.buf_pos += to_copy;
                total_read += to_copy;
            } else {
                self.buf_pos = 0;
                self.buf_len = self.inner.read(&mut self.buffer)?;
                if self.buf_len == 0 {
                    break;
                }
            }
        }
        Ok(total_read)
    }

    /// 读取指定数量的字节
    pub fn read_bytes(&mut self, count: usize) -> EblResult<Vec<u8>> {
        let mut buf = vec![0u8; count];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// 跳过指定字节数
    ///
    /// 不可寻址的后端会逐块丢弃数据, 流提前结束时返回 [`EblError::Eof`].
    pub fn skip(&mut self, count: usize) -> EblResult<()> {
        // 先尝试消耗缓冲区中的数据
        let buffered = self.buf_len - self.buf_pos;
        if count <= buffered {
            self.buf_pos += count;
            return Ok(());
        }

        // 跳过缓冲区中所有剩余数据
        let remaining = count - buffered;
        self.buf_pos = self.buf_len;

        if self.inner.is_seekable() {
            self.inner.seek(io::SeekFrom::Current(remaining as i64))?;
        } else {
            // 逐块丢弃读取的数据
            let mut left = remaining;
            while left > 0 {
                let to_read = left.min(self.buffer.len());
                self.buf_len = self.inner.read(&mut self.buffer[..to_read])?;
                if self.buf_len == 0 {
                    return Err(EblError::Eof);
                }
                left -= self.buf_len;
            }
            self.buf_pos = 0;
            self.buf_len = 0;
        }
        Ok(())
    }

    // ========================
    // 写入方法
    // ========================

    /// 写入全部数据
    pub fn write_all(&mut self, buf: &[u8]) -> EblResult<()> {
        self.inner.write_all(buf)?;
        Ok(())
    }

    /// 刷新写缓冲
    pub fn flush(&mut self) -> EblResult<()> {
        self.inner.flush()?;
        Ok(())
    }

    // ========================
    // 定位方法
    // ========================

    /// 定位 (seek)
    ///
    /// 注意: seek 会清空读缓冲区.
    pub fn seek(&mut self, pos: io::SeekFrom) -> EblResult<u64> {
        self.buf_pos = 0;
        self.buf_len = 0;
        Ok(self.inner.seek(pos)?)
    }

    /// 获取当前位置
    ///
    /// 考虑读缓冲区中尚未消耗的数据量.
    pub fn position(&mut self) -> EblResult<u64> {
        let raw_pos = self.inner.position()?;
        let buffered = (self.buf_len - self.buf_pos) as u64;
        Ok(raw_pos - buffered)
    }

    /// 获取总大小
    pub fn size(&self) -> Option<u64> {
        self.inner.size()
    }
}

/// 文件 I/O 后端
struct FileBackend {
    file: std::fs::File,
    size: Option<u64>,
}

impl FileBackend {
    fn new(file: std::fs::File) -> Self {
        let size = file.metadata().ok().map(|m| m.len());
        Self { file, size }
    }
}

impl IoBackend for FileBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.file.write_all(buf)
    }

    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }

    fn position(&mut self) -> io::Result<u64> {
        self.file.stream_position()
    }

    fn size(&self) -> Option<u64> {
        self.size
    }

    fn is_seekable(&self) -> bool {
        true
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// 内存缓冲区 I/O 后端
///
/// 用于测试和内存中处理.
pub struct MemoryBackend {
    /// 数据缓冲区
    data: Vec<u8>,
    /// 当前位置
    pos: usize,
}

impl MemoryBackend {
    /// 从已有数据创建 (用于读取)
    pub fn from_data(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    /// 创建空缓冲区 (用于写入)
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            pos: 0,
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl IoBackend for MemoryBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.data.len().saturating_sub(self.pos);
        let to_read = buf.len().min(available);
        if to_read == 0 {
            return Ok(0);
        }
        buf[..to_read].copy_from_slice(&self.data[self.pos..self.pos + to_read]);
        self.pos += to_read;
        Ok(to_read)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.pos >= self.data.len() {
            self.data.resize(self.pos, 0);
            self.data.extend_from_slice(buf);
        } else {
            // 覆盖已有数据
            let overlap = (self.data.len() - self.pos).min(buf.len());
            self.data[self.pos..self.pos + overlap].copy_from_slice(&buf[..overlap]);
            if buf.len() > overlap {
                self.data.extend_from_slice(&buf[overlap..]);
            }
        }
        self.pos += buf.len();
        Ok(())
    }

    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let new_pos = match pos {
            io::SeekFrom::Start(offset) => offset as i64,
            io::SeekFrom::End(offset) => self.data.len() as i64 + offset,
            io::SeekFrom::Current(offset) => self.pos as i64 + offset,
        };
        if new_pos < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek 位置不能为负",
            ));
        }
        self.pos = new_pos as usize;
        Ok(self.pos as u64)
    }

    fn position(&mut self) -> io::Result<u64> {
        Ok(self.pos as u64)
    }

    fn size(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }

    fn is_seekable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_读取_到达末尾() {
        let mut io = IoContext::from_data(b"FORM\x00\x00".to_vec());
        let mut tag = [0u8; 4];
        io.read_exact(&mut tag).unwrap();
        assert_eq!(&tag, b"FORM");
        assert_eq!(io.position().unwrap(), 4);
        assert!(matches!(io.read_exact(&mut tag).unwrap_err(), EblError::Eof));
    }

    #[test]
    fn test_部分读取_返回实际长度() {
        let mut io = IoContext::from_data(vec![1, 2, 3]);
        let mut buf = [0u8; 8];
        assert_eq!(io.read_up_to(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
        assert_eq!(io.read_up_to(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_跳过与位置() {
        let mut io = IoContext::from_data((0u8..100).collect());
        io.skip(10).unwrap();
        assert_eq!(io.read_bytes(2).unwrap(), vec![10, 11]);
        assert_eq!(io.position().unwrap(), 12);
        assert_eq!(io.size(), Some(100));
    }

    #[test]
    fn test_写入与回读() {
        let mut io = IoContext::new(Box::new(MemoryBackend::new()));
        io.write_all(b"RIFF").unwrap();
        io.write_all(&36u32.to_le_bytes()).unwrap();
        io.seek(io::SeekFrom::Start(2)).unwrap();
        io.write_all(b"FF").unwrap();
        io.seek(io::SeekFrom::Start(0)).unwrap();
        assert_eq!(io.read_bytes(8).unwrap(), b"RIFF\x24\x00\x00\x00".to_vec());
    }

    #[test]
    fn test_文件后端() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("io.bin");
        let mut io = IoContext::open_write(&path).unwrap();
        io.write_all(b"E5S1").unwrap();
        io.flush().unwrap();
        drop(io);

        let mut io = IoContext::open_read(&path).unwrap();
        assert_eq!(io.size(), Some(4));
        assert_eq!(io.read_bytes(4).unwrap(), b"E5S1".to_vec());
    }
}
