//! Tests for ObjectPool.

#[cfg(test)]
mod tests {
    use super::super::object_pool::{Lifetime, ObjectPool, PoolError, Poolable};
    use bevy::prelude::*;
    use rstest::rstest;

    /// Минимальный poolable: считает активации и хранит trail
    #[derive(Debug, Clone, Default)]
    struct Spark {
        active: bool,
        activations: u32,
        trail: Vec<Vec3>,
    }

    impl Poolable for Spark {
        fn activate(&mut self, position: Vec3, _rotation: Quat) {
            self.active = true;
            self.activations += 1;
            self.trail.push(position);
        }

        fn deactivate(&mut self) {
            self.active = false;
            self.trail.clear();
        }

        fn lifetime(&self) -> Lifetime {
            Lifetime::Manual
        }
    }

    fn pool(size: usize, expandable: bool) -> ObjectPool<Spark> {
        match ObjectPool::initialize("spark", Some(Spark::default()), size, expandable) {
            Ok(pool) => pool,
            Err(err) => panic!("pool init failed: {}", err),
        }
    }

    #[rstest]
    #[case(1, true)]
    #[case(1, false)]
    #[case(3, true)]
    #[case(3, false)]
    #[case(8, false)]
    fn test_acquire_past_capacity_depends_on_expandable(#[case] size: usize, #[case] expandable: bool) {
        let mut pool = pool(size, expandable);

        for _ in 0..size {
            assert!(pool.acquire().is_some());
        }
        assert_eq!(pool.available_count(), 0);

        let extra = pool.acquire();
        assert_eq!(extra.is_some(), expandable);
        assert_eq!(pool.total_count(), if expandable { size + 1 } else { size });
    }

    #[test]
    fn test_exhausted_error_names_key() {
        let mut pool = pool(1, false);
        assert!(pool.try_acquire().is_ok());
        assert_eq!(
            pool.try_acquire(),
            Err(PoolError::Exhausted { key: "spark".into() })
        );
    }

    #[test]
    fn test_missing_prefab_rejected() {
        let result = ObjectPool::<Spark>::initialize("spark", None, 4, true);
        assert_eq!(
            result.err(),
            Some(PoolError::MissingPrefab { key: "spark".into() })
        );
    }

    #[test]
    fn test_empty_key_rejected() {
        let result = ObjectPool::initialize("", Some(Spark::default()), 4, true);
        assert_eq!(result.err(), Some(PoolError::EmptyKey));
    }

    #[test]
    fn test_double_release_rejected_counts_unchanged() {
        let mut pool = pool(2, false);
        let handle = pool.acquire();
        let Some(handle) = handle else {
            panic!("expected an instance");
        };

        assert!(pool.release(handle).is_ok());
        assert_eq!(pool.available_count(), 2);
        assert_eq!(pool.in_use_count(), 0);

        // Второй release по тому же handle: caller error
        assert!(matches!(pool.release(handle), Err(PoolError::NotCheckedOut { .. })));
        assert_eq!(pool.available_count(), 2);
        assert_eq!(pool.in_use_count(), 0);
    }

    #[test]
    fn test_stale_handle_does_not_release_reused_slot() {
        let mut pool = pool(1, false);
        let Some(first) = pool.acquire() else {
            panic!("expected an instance");
        };
        assert!(pool.release(first).is_ok());

        // Тот же slot выдан снова: старый handle уже не валиден
        let Some(second) = pool.acquire() else {
            panic!("expected an instance");
        };
        assert!(pool.release(first).is_err());
        assert!(pool.is_checked_out(second));
        assert_eq!(pool.in_use_count(), 1);
    }

    #[test]
    fn test_release_clears_transient_state() {
        let mut pool = pool(1, false);
        let Some(handle) = pool.acquire() else {
            panic!("expected an instance");
        };
        if let Some(spark) = pool.get_mut(handle) {
            spark.activate(Vec3::ONE, Quat::IDENTITY);
            spark.trail.push(Vec3::X);
        }
        assert!(pool.release(handle).is_ok());

        let Some(again) = pool.acquire() else {
            panic!("expected an instance");
        };
        let spark = pool.get(again).cloned().unwrap_or_default();
        assert!(!spark.active);
        assert!(spark.trail.is_empty());
        assert_eq!(spark.activations, 1);
    }

    #[test]
    fn test_clear_all_returns_everything() {
        let mut pool = pool(3, true);
        for _ in 0..5 {
            assert!(pool.acquire().is_some());
        }
        assert_eq!(pool.in_use_count(), 5);

        assert_eq!(pool.clear_all(), 5);
        assert_eq!(pool.in_use_count(), 0);
        assert_eq!(pool.available_count(), 5);
    }

    #[test]
    fn test_container_name() {
        let pool = pool(0, true);
        assert_eq!(pool.container(), "[Pool_spark]");
        assert_eq!(pool.key(), "spark");
    }
}
