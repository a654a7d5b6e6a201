mod paid_net;
mod price;
