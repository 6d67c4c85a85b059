mod arguments;
mod entities;
mod interface_object;
mod provides;
mod subscriptions;
