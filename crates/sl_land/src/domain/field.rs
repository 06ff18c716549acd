// crates/sl_land/src/domain/field.rs

//! SpatialField - 定义在网格分区上的场
//!
//! 数据按列连续存放：索引 = `column * n_layers + layer`，第 0 层为最底层。

use sl_config::ConfigError;

use super::space::Space;

/// 空间场
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialField<T = f64> {
    space: Space,
    data: Vec<T>,
}

impl<T: Copy> SpatialField<T> {
    /// 用常数填充
    pub fn filled(space: Space, value: T) -> Self {
        Self {
            space,
            data: vec![value; space.len()],
        }
    }

    /// 按 (列, 层) 生成
    pub fn from_fn(space: Space, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let n_layers = space.n_layers();
        let data = (0..space.len())
            .map(|i| f(i / n_layers, i % n_layers))
            .collect();
        Self { space, data }
    }

    /// 从已有数组创建，长度必须与空间一致
    pub fn from_vec(space: Space, data: Vec<T>) -> Result<Self, ConfigError> {
        if data.len() != space.len() {
            return Err(ConfigError::invalid(
                format!("field@{}", space),
                data.len(),
                format!("数组长度必须为 {}", space.len()),
            ));
        }
        Ok(Self { space, data })
    }

    /// 所在空间
    #[inline]
    pub fn space(&self) -> &Space {
        &self.space
    }

    /// 数据
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// 可变数据
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// 点数
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 取值
    #[inline]
    pub fn get(&self, column: usize, layer: usize) -> T {
        self.data[column * self.space.n_layers() + layer]
    }

    /// 某一列的全部层
    #[inline]
    pub fn column(&self, column: usize) -> &[T] {
        let n = self.space.n_layers();
        &self.data[column * n..(column + 1) * n]
    }

    /// 逐点映射
    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> SpatialField<U> {
        SpatialField {
            space: self.space,
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    /// 与另一场逐点组合，两者必须在同一空间
    pub fn zip_map<U: Copy, V: Copy>(
        &self,
        other: &SpatialField<U>,
        f: impl Fn(T, U) -> V,
    ) -> SpatialField<V> {
        debug_assert_eq!(self.space, other.space);
        SpatialField {
            space: self.space,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    /// 检查场是否定义在期望空间上
    pub fn ensure_on(&self, expected: &Space, name: &str) -> Result<(), ConfigError> {
        if self.space != *expected {
            return Err(ConfigError::PartitionMismatch {
                field: name.to_string(),
                expected: expected.to_string(),
                actual: self.space.to_string(),
            });
        }
        Ok(())
    }
}

impl SpatialField<f64> {
    /// 零场
    pub fn zeros(space: Space) -> Self {
        Self::filled(space, 0.0)
    }

    /// 按列可变迭代
    pub fn columns_mut(&mut self) -> std::slice::ChunksMut<'_, f64> {
        let n = self.space.n_layers();
        self.data.chunks_mut(n)
    }

    /// 全部置为同一值
    pub fn fill(&mut self, value: f64) {
        self.data.iter_mut().for_each(|x| *x = value);
    }

    /// 从另一场复制
    pub fn copy_from(&mut self, other: &Self) {
        debug_assert_eq!(self.space, other.space);
        self.data.copy_from_slice(&other.data);
    }

    /// y = y + alpha * x
    pub fn axpy(&mut self, alpha: f64, x: &Self) {
        debug_assert_eq!(self.space, x.space);
        for (y, &xi) in self.data.iter_mut().zip(x.data.iter()) {
            *y += alpha * xi;
        }
    }

    /// 最大绝对值
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0_f64, |m, x| m.max(x.abs()))
    }

    /// 全部为有限值
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::space::Partition;

    fn subsurface() -> Space {
        Space::new(7, Partition::Subsurface, 3, 4)
    }

    #[test]
    fn test_layout_is_column_major() {
        let f = SpatialField::from_fn(subsurface(), |c, l| (c * 10 + l) as f64);
        assert_eq!(f.get(2, 3), 23.0);
        assert_eq!(f.column(1), &[10.0, 11.0, 12.0, 13.0]);
    }

    #[test]
    fn test_from_vec_length_checked() {
        assert!(SpatialField::from_vec(subsurface(), vec![0.0; 5]).is_err());
        assert!(SpatialField::from_vec(subsurface(), vec![0.0; 12]).is_ok());
    }

    #[test]
    fn test_ensure_on_rejects_other_partition() {
        let surface = Space::new(7, Partition::Surface, 3, 4);
        let f = SpatialField::zeros(surface);
        let err = f.ensure_on(&subsurface(), "K_sat").unwrap_err();
        assert!(matches!(err, ConfigError::PartitionMismatch { .. }));
    }

    #[test]
    fn test_axpy() {
        let mut y = SpatialField::filled(subsurface(), 1.0);
        let x = SpatialField::filled(subsurface(), 2.0);
        y.axpy(0.5, &x);
        assert!(y.data().iter().all(|&v| v == 2.0));
    }
}
