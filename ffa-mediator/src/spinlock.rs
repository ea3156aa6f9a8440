/*
 * Copyright 2023 The Hafnium Authors.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     https://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! A minimal test-and-set lock for the few places where the mediator writes
//! shared state outside of boot: the log writer.

use core::cell::UnsafeCell;
use core::hint;
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

pub struct RawSpinLock {
    inner: AtomicBool,
}

impl RawSpinLock {
    pub const fn new() -> Self {
        Self {
            inner: AtomicBool::new(false),
        }
    }

    pub fn lock(&self) {
        while self.inner.swap(true, Ordering::Acquire) {
            hint::spin_loop();
        }
    }

    pub fn try_lock(&self) -> bool {
        !self.inner.swap(true, Ordering::Acquire)
    }

    pub fn unlock(&self) {
        self.inner.store(false, Ordering::Release);
    }
}

pub struct SpinLock<T> {
    lock: RawSpinLock,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for SpinLock<T> {}
unsafe impl<T: Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    pub const fn new(data: T) -> Self {
        Self {
            lock: RawSpinLock::new(),
            data: UnsafeCell::new(data),
        }
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    pub fn lock(&self) -> SpinLockGuard<T> {
        self.lock.lock();
        SpinLockGuard {
            lock: self,
            _marker: PhantomData,
        }
    }

    pub fn try_lock(&self) -> Option<SpinLockGuard<T>> {
        if self.lock.try_lock() {
            Some(SpinLockGuard {
                lock: self,
                _marker: PhantomData,
            })
        } else {
            None
        }
    }
}

pub struct SpinLockGuard<'s, T> {
    lock: &'s SpinLock<T>,
    _marker: PhantomData<*const ()>, // !Send + !Sync
}

unsafe impl<'s, T: Send + Sync> Sync for SpinLockGuard<'s, T> {}

impl<'s, T> Drop for SpinLockGuard<'s, T> {
    fn drop(&mut self) {
        self.lock.lock.unlock();
    }
}

impl<'s, T> Deref for SpinLockGuard<'s, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        unsafe { &*self.lock.data.get() }
    }
}

impl<'s, T> DerefMut for SpinLockGuard<'s, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { &mut *self.lock.data.get() }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn try_lock_fails_while_held() {
        let lock = SpinLock::new(0u32);
        let guard = lock.lock();
        assert!(lock.try_lock().is_none());
        drop(guard);
        assert!(lock.try_lock().is_some());
    }

    #[test]
    fn guard_writes_are_visible_after_unlock() {
        let lock = SpinLock::new(1u32);
        *lock.lock() += 41;
        assert_eq!(lock.into_inner(), 42);
    }
}
